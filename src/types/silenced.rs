use serde::{Deserialize, Serialize};

use super::{validate_name, DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

/// Suppresses handling for a subscription, a check, or both.
/// The name is always `<subscription>:<check>` with `*` standing in for "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Silenced {
    #[serde(rename = "metadata", default)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subscription: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub check: String,
    /// Seconds until expiry; -1 never expires
    #[serde(default)]
    pub expire: i64,
    #[serde(default)]
    pub expire_on_resolve: bool,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub begin: i64,
}

const ANY: &str = "*";

impl Silenced {
    pub fn fixture(namespace: &str, subscription: &str, check: &str) -> Self {
        let mut silenced = Self {
            meta: ObjectMeta::new(namespace, ""),
            subscription: subscription.into(),
            check: check.into(),
            expire: -1,
            ..Default::default()
        };
        silenced.normalize();
        silenced
    }

    pub fn silenced_name(subscription: &str, check: &str) -> String {
        let part = |s: &str| if s.is_empty() { ANY.to_string() } else { s.to_string() };
        format!("{}:{}", part(subscription), part(check))
    }
}

impl Resource for Silenced {
    const KIND: &'static str = "silenced";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::FetchFirst;
    const EMPTY_NAME: EmptyName = EmptyName::InvalidArgument;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn normalize(&mut self) {
        if self.begin == 0 {
            self.begin = chrono::Utc::now().timestamp();
        }
        self.meta.name = Silenced::silenced_name(&self.subscription, &self.check);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.subscription.is_empty() && self.check.is_empty() {
            return Err(ValidationError::new(
                "subscription",
                "must provide a subscription, a check, or both",
            ));
        }
        if self.expire < -1 {
            return Err(ValidationError::new("expire", "must be -1 or a positive number of seconds"));
        }
        Ok(())
    }

    fn validate_all(&self) -> Result<(), ValidationError> {
        validate_name(&self.meta.namespace)
            .map_err(|e| ValidationError::new("namespace", e.reason))?;
        for part in [&self.subscription, &self.check] {
            if !part.is_empty() && part.as_str() != ANY {
                validate_name(part)?;
            }
        }
        if self.meta.name != Silenced::silenced_name(&self.subscription, &self.check) {
            return Err(ValidationError::new("name", "must be <subscription>:<check>"));
        }
        self.validate()
    }

    fn apply_update(&mut self, delta: Self) {
        self.expire = delta.expire;
        self.expire_on_resolve = delta.expire_on_resolve;
        self.creator = delta.creator;
        self.reason = delta.reason;
        self.begin = delta.begin;
    }
}
