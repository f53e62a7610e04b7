use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    validate_name, CheckStatus, DestroyOrder, EmptyName, Entity, ObjectMeta, Resource, Scope,
    ValidationError,
};

/// Observation about an entity, usually the latest result of one check.
///
/// Events are keyed by `(namespace, entity, check)`; the stored name is
/// `<entity>/<check>`, so every event of one entity shares the `<entity>/` prefix.
/// Metric-only events have no check and are keyed by their id instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "metadata", default)]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub timestamp: i64,
    pub entity: Entity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
}

impl Event {
    pub fn new(entity: Entity, check: Option<CheckStatus>) -> Self {
        let mut event = Self {
            meta: ObjectMeta::default(),
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now().timestamp(),
            entity,
            check,
            metrics: None,
        };
        event.normalize();
        event
    }

    pub fn fixture(namespace: &str, entity: &str, check: &str) -> Self {
        let check = CheckStatus {
            meta: ObjectMeta::new(namespace, check),
            command: "true".into(),
            output: "ok".into(),
            ..Default::default()
        };
        Self::new(Entity::fixture(namespace, entity), Some(check))
    }

    pub fn has_check(&self) -> bool {
        self.check.is_some()
    }

    pub fn entity_name(&self) -> &str {
        &self.entity.meta.name
    }

    pub fn check_name(&self) -> Option<&str> {
        self.check.as_ref().map(|c| c.meta.name.as_str())
    }

    /// Stored name for an entity/check pair
    pub fn key_name(entity: &str, check: &str) -> String {
        format!("{}/{}", entity, check)
    }
}

impl Resource for Event {
    const KIND: &'static str = "events";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::AuthorizeFirst;
    const EMPTY_NAME: EmptyName = EmptyName::InvalidArgument;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn normalize(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::new_v4();
        }
        if self.timestamp == 0 {
            self.timestamp = chrono::Utc::now().timestamp();
        }
        if self.meta.namespace.is_empty() {
            self.meta.namespace = self.entity.meta.namespace.clone();
        }
        if self.entity.meta.namespace.is_empty() {
            self.entity.meta.namespace = self.meta.namespace.clone();
        }
        let suffix = match &mut self.check {
            Some(check) => {
                if check.meta.namespace.is_empty() {
                    check.meta.namespace = self.meta.namespace.clone();
                }
                check.meta.name.clone()
            }
            None => self.id.to_string(),
        };
        self.meta.name = Event::key_name(&self.entity.meta.name, &suffix);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.entity
            .validate_all()
            .map_err(|e| ValidationError::new("entity", e.to_string()))?;
        if let Some(check) = &self.check {
            validate_name(&check.meta.name)
                .map_err(|e| ValidationError::new("check", e.reason))?;
            if check.meta.namespace != self.meta.namespace {
                return Err(ValidationError::new(
                    "check",
                    "namespace does not match the event namespace",
                ));
            }
        }
        if self.entity.meta.namespace != self.meta.namespace {
            return Err(ValidationError::new(
                "entity",
                "namespace does not match the event namespace",
            ));
        }
        if self.timestamp <= 0 {
            return Err(ValidationError::new("timestamp", "must be positive"));
        }
        Ok(())
    }

    // The stored name is composite, so the name check runs per component
    fn validate_all(&self) -> Result<(), ValidationError> {
        validate_name(&self.meta.namespace)
            .map_err(|e| ValidationError::new("namespace", e.reason))?;
        if self.meta.name != self.expected_name() {
            return Err(ValidationError::new(
                "name",
                "does not match the entity and check names",
            ));
        }
        self.validate()
    }

    // Events are replaced wholesale
    fn apply_update(&mut self, delta: Self) {
        let _ = delta;
    }
}

impl Event {
    fn expected_name(&self) -> String {
        match self.check_name() {
            Some(check) => Event::key_name(self.entity_name(), check),
            None => Event::key_name(self.entity_name(), &self.id.to_string()),
        }
    }
}
