//! Resource kinds served by the API and the descriptor trait every kind implements

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod asset;
pub mod check;
pub mod entity;
pub mod event;
pub mod filter;
pub mod handler;
pub mod hook;
pub mod mutator;
pub mod namespace;
pub mod rbac;
pub mod silenced;
pub mod user;

pub use asset::Asset;
pub use check::{CheckConfig, CheckStatus};
pub use entity::Entity;
pub use event::Event;
pub use filter::EventFilter;
pub use handler::Handler;
pub use hook::HookConfig;
pub use mutator::Mutator;
pub use namespace::Namespace;
pub use rbac::{ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRef, Rule, Subject};
pub use silenced::Silenced;
pub use user::User;

/// Identity and free-form metadata shared by every resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self::new("", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Namespaced,
    Cluster,
}

/// Where the delete capability check sits relative to the existence fetch.
/// The order decides whether an unauthorized caller sees PermissionDenied or NotFound first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOrder {
    AuthorizeFirst,
    FetchFirst,
}

/// Outcome of a lookup with an empty name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyName {
    InvalidArgument,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Per-kind descriptor consumed by the generic controller.
pub trait Resource:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Path and key segment, e.g. `checks`
    const KIND: &'static str;
    const SCOPE: Scope;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::AuthorizeFirst;
    const EMPTY_NAME: EmptyName = EmptyName::NotFound;

    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Kind-specific validation; name and namespace rules are checked separately.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Copy the kind's mutable fields from `delta` onto `self`. Anything not
    /// assigned here is immutable through Update.
    fn apply_update(&mut self, delta: Self);

    /// Fill derived fields before validation
    fn normalize(&mut self) {}

    /// Finalize after validation, before the resource is written, e.g. hashing secrets.
    fn prepare(&mut self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Strip anything that must never leave the server.
    fn redacted(self) -> Self {
        self
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn namespace(&self) -> &str {
        &self.meta().namespace
    }

    /// Name, scope and kind rules together
    fn validate_all(&self) -> Result<(), ValidationError> {
        validate_name(self.name())?;
        match Self::SCOPE {
            Scope::Namespaced => validate_name(self.namespace())
                .map_err(|e| ValidationError::new("namespace", e.reason))?,
            Scope::Cluster if !self.namespace().is_empty() => {
                return Err(ValidationError::new(
                    "namespace",
                    format!("{} are not namespaced", Self::KIND),
                ))
            }
            Scope::Cluster => {}
        }
        self.validate()
    }
}

const MAX_NAME_LEN: usize = 253;

/// Names are path segments and key segments: no separators, no whitespace.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::new(
            "name",
            format!("must be at most {} bytes", MAX_NAME_LEN),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-')))
    {
        return Err(ValidationError::new(
            "name",
            format!("contains invalid character {:?}", c),
        ));
    }
    Ok(())
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}
