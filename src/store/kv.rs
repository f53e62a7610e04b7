use async_trait::async_trait;

use super::StoreError;
use crate::types::{Resource, Scope};

/// One page of a key range scan
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub entries: Vec<(String, Vec<u8>)>,
    /// First key of the next page, if any
    pub next: Option<String>,
}

/// Byte-oriented backend with ordered keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Keys starting with `prefix`, in key order, from `start` inclusive
    /// (the beginning of the prefix when `start` is empty). `limit` of 0 means all.
    async fn range(&self, prefix: &str, start: &str, limit: usize) -> Result<Page, StoreError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Fails with `StoreError::NotFound` when the key is absent
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Key layout: `<root>/<kind>/<namespace>/<name>`, or `<root>/<kind>/<name>`
/// for cluster-scoped kinds.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    root: String,
}

impl KeyBuilder {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn key<T: Resource>(&self, namespace: &str, name: &str) -> String {
        format!("{}{}", self.collection::<T>(namespace), name)
    }

    /// Prefix covering one collection, with trailing separator.
    /// An empty namespace on a namespaced kind covers every namespace.
    pub fn collection<T: Resource>(&self, namespace: &str) -> String {
        match T::SCOPE {
            Scope::Namespaced if !namespace.is_empty() => {
                format!("{}/{}/{}/", self.root, T::KIND, namespace)
            }
            _ => format!("{}/{}/", self.root, T::KIND),
        }
    }
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new("/monitor.io")
    }
}

/// Validates a caller-provided resume key against the collection being scanned.
pub(crate) fn check_start(prefix: &str, start: &str) -> Result<(), StoreError> {
    if !start.is_empty() && !start.starts_with(prefix) {
        return Err(StoreError::NotValid(
            "continue token does not belong to this collection".to_string(),
        ));
    }
    Ok(())
}
