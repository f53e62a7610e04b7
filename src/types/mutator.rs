use serde::{Deserialize, Serialize};

use super::{require, DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

/// Transforms event data before it reaches a handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutator {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub env_vars: Vec<String>,
    #[serde(default)]
    pub runtime_assets: Vec<String>,
}

impl Mutator {
    pub fn fixture(namespace: &str, name: &str) -> Self {
        Self {
            meta: ObjectMeta::new(namespace, name),
            command: "jq .".into(),
            ..Default::default()
        }
    }
}

impl Resource for Mutator {
    const KIND: &'static str = "mutators";
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
        require("command", &self.command)
    }

    fn apply_update(&mut self, delta: Self) {
        self.command = delta.command;
        self.timeout = delta.timeout;
        self.env_vars = delta.env_vars;
        self.runtime_assets = delta.runtime_assets;
    }
}
