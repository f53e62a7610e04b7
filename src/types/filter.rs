use serde::{Deserialize, Serialize};

use super::{DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

/// Allow/deny rule evaluated against events before handlers run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub expressions: Vec<String>,
    #[serde(default)]
    pub runtime_assets: Vec<String>,
}

impl EventFilter {
    pub fn fixture(namespace: &str, name: &str) -> Self {
        Self {
            meta: ObjectMeta::new(namespace, name),
            action: "allow".into(),
            expressions: vec!["event.check.status != 0".into()],
            runtime_assets: Vec::new(),
        }
    }
}

impl Resource for EventFilter {
    const KIND: &'static str = "filters";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::AuthorizeFirst;
    const EMPTY_NAME: EmptyName = EmptyName::NotFound;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.action.as_str(), "allow" | "deny") {
            return Err(ValidationError::new("action", "must be allow or deny"));
        }
        if self.expressions.iter().all(|e| e.trim().is_empty()) {
            return Err(ValidationError::new("expressions", "at least one expression is required"));
        }
        Ok(())
    }

    fn apply_update(&mut self, delta: Self) {
        self.action = delta.action;
        self.expressions = delta.expressions;
        self.runtime_assets = delta.runtime_assets;
    }
}
