use serde::{Deserialize, Serialize};

use super::{require, DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deregistration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub handler: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub arch: String,
}

/// A monitored thing: an agent host or a proxy entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub entity_class: String,
    #[serde(default)]
    pub system: System,
    #[serde(default)]
    pub subscriptions: Vec<String>,
    #[serde(default)]
    pub last_seen: i64,
    #[serde(default)]
    pub deregister: bool,
    #[serde(default)]
    pub deregistration: Deregistration,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default)]
    pub redact: Vec<String>,
}

impl Entity {
    pub fn fixture(namespace: &str, name: &str) -> Self {
        Self {
            meta: ObjectMeta::new(namespace, name),
            entity_class: "host".into(),
            subscriptions: vec!["linux".into(), format!("entity:{}", name)],
            last_seen: chrono::Utc::now().timestamp(),
            redact: vec!["password".into()],
            ..Default::default()
        }
    }
}

impl Resource for Entity {
    const KIND: &'static str = "entities";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::AuthorizeFirst;
    const EMPTY_NAME: EmptyName = EmptyName::InvalidArgument;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("entity_class", &self.entity_class)
    }

    fn apply_update(&mut self, delta: Self) {
        self.subscriptions = delta.subscriptions;
        self.deregister = delta.deregister;
        self.deregistration = delta.deregistration;
        self.redact = delta.redact;
        self.user = delta.user;
        self.meta.labels = delta.meta.labels;
        self.meta.annotations = delta.meta.annotations;
    }
}
