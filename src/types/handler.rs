use serde::{Deserialize, Serialize};

use super::{require, DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSocket {
    pub host: String,
    pub port: u16,
}

/// Event sink: pipe to a command, write to a socket, or fan out to a set of handlers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Handler {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(rename = "type", default)]
    pub handler_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mutator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default)]
    pub timeout: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<HandlerSocket>,
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub env_vars: Vec<String>,
    #[serde(default)]
    pub runtime_assets: Vec<String>,
}

impl Handler {
    pub fn fixture(namespace: &str, name: &str) -> Self {
        Self {
            meta: ObjectMeta::new(namespace, name),
            handler_type: "pipe".into(),
            command: "cat".into(),
            ..Default::default()
        }
    }
}

impl Resource for Handler {
    const KIND: &'static str = "handlers";
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
        match self.handler_type.as_str() {
            "pipe" => require("command", &self.command),
            "tcp" | "udp" => match &self.socket {
                Some(socket) if !socket.host.is_empty() && socket.port > 0 => Ok(()),
                _ => Err(ValidationError::new("socket", "host and port are required")),
            },
            "set" if self.handlers.is_empty() => {
                Err(ValidationError::new("handlers", "a set needs at least one handler"))
            }
            "set" => Ok(()),
            "" => Err(ValidationError::new("type", "must not be empty")),
            other => Err(ValidationError::new("type", format!("unknown handler type {:?}", other))),
        }
    }

    fn apply_update(&mut self, delta: Self) {
        self.handler_type = delta.handler_type;
        self.mutator = delta.mutator;
        self.command = delta.command;
        self.timeout = delta.timeout;
        self.socket = delta.socket;
        self.handlers = delta.handlers;
        self.filters = delta.filters;
        self.env_vars = delta.env_vars;
        self.runtime_assets = delta.runtime_assets;
    }
}
