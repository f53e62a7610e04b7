use serde::{Deserialize, Serialize};

use super::{DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
}

impl Namespace {
    pub fn new(name: &str) -> Self {
        Self {
            meta: ObjectMeta::cluster(name),
        }
    }
}

impl Resource for Namespace {
    const KIND: &'static str = "namespaces";
    const SCOPE: Scope = Scope::Cluster;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::AuthorizeFirst;
    const EMPTY_NAME: EmptyName = EmptyName::InvalidArgument;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    // Namespaces have nothing mutable beyond their name
    fn apply_update(&mut self, _delta: Self) {}
}
