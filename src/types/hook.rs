use serde::{Deserialize, Serialize};

use super::{require, DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

/// Command run on the agent in response to a check result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub stdin: bool,
}

impl HookConfig {
    pub fn fixture(namespace: &str, name: &str) -> Self {
        Self {
            meta: ObjectMeta::new(namespace, name),
            command: "ps aux".into(),
            timeout: 10,
            stdin: false,
        }
    }
}

impl Resource for HookConfig {
    const KIND: &'static str = "hooks";
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
        require("command", &self.command)?;
        if self.timeout == 0 {
            return Err(ValidationError::new("timeout", "must be greater than 0"));
        }
        Ok(())
    }

    fn apply_update(&mut self, delta: Self) {
        self.command = delta.command;
        self.timeout = delta.timeout;
        self.stdin = delta.stdin;
    }
}
