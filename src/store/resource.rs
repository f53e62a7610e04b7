use async_trait::async_trait;
use std::sync::Arc;

use super::kv::{KeyBuilder, KeyValueStore};
use super::{SelectionPredicate, Store, StoreError};
use crate::types::Resource;

/// JSON-encoded resources of one kind on top of a key-value backend
pub struct ResourceStore<T> {
    kv: Arc<dyn KeyValueStore>,
    keys: KeyBuilder,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceStore<T> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            keys: self.keys.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: Resource> ResourceStore<T> {
    pub fn new(kv: Arc<dyn KeyValueStore>, keys: KeyBuilder) -> Self {
        Self {
            kv,
            keys,
            _phantom: std::marker::PhantomData,
        }
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<T, StoreError> {
        serde_json::from_slice(bytes).map_err(|source| StoreError::Codec {
            key: key.to_string(),
            source,
        })
    }

    fn list_prefix(&self, namespace: &str, subcollection: &str) -> String {
        let collection = self.keys.collection::<T>(namespace);
        if subcollection.is_empty() {
            collection
        } else {
            format!("{}{}/", collection, subcollection)
        }
    }
}

#[async_trait]
impl<T: Resource> Store<T> for ResourceStore<T> {
    async fn get_by_name(&self, namespace: &str, name: &str) -> Result<Option<T>, StoreError> {
        let key = self.keys.key::<T>(namespace, name);
        match self.kv.get(&key).await? {
            Some(bytes) => Self::decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self, namespace: &str, pred: &mut SelectionPredicate) -> Result<Vec<T>, StoreError> {
        if pred.limit < 0 {
            return Err(StoreError::NotValid("limit must not be negative".to_string()));
        }
        let prefix = self.list_prefix(namespace, &pred.subcollection);
        let page = self
            .kv
            .range(&prefix, &pred.continue_token, pred.limit as usize)
            .await?;

        pred.continue_token = page.next.unwrap_or_default();
        page.entries
            .iter()
            .map(|(key, bytes)| Self::decode(key, bytes))
            .collect()
    }

    async fn update(&self, resource: &T) -> Result<(), StoreError> {
        let key = self.keys.key::<T>(resource.namespace(), resource.name());
        let bytes = serde_json::to_vec(resource).map_err(|source| StoreError::Codec {
            key: key.clone(),
            source,
        })?;
        self.kv.put(&key, bytes).await
    }

    async fn delete_by_name(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.kv.delete(&self.keys.key::<T>(namespace, name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{CheckConfig, Namespace};

    fn checks() -> ResourceStore<CheckConfig> {
        ResourceStore::new(Arc::new(MemoryStore::new()), KeyBuilder::default())
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = checks();
        let check = CheckConfig::fixture("default", "cpu");
        store.update(&check).await.unwrap();

        assert_eq!(store.get_by_name("default", "cpu").await.unwrap(), Some(check));
        assert_eq!(store.get_by_name("other", "cpu").await.unwrap(), None);
        assert_eq!(store.get_by_name("default", "CPU").await.unwrap(), None);

        store.delete_by_name("default", "cpu").await.unwrap();
        assert!(matches!(
            store.delete_by_name("default", "cpu").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_pages_and_stays_in_namespace() {
        let store = checks();
        for name in ["a", "b", "c"] {
            store.update(&CheckConfig::fixture("default", name)).await.unwrap();
        }
        store.update(&CheckConfig::fixture("prod", "z")).await.unwrap();

        let mut pred = SelectionPredicate::new(2);
        let first = store.list("default", &mut pred).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(pred.has_more());

        let second = store.list("default", &mut pred).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].meta.name, "c");
        assert!(!pred.has_more());

        let mut all = SelectionPredicate::default();
        assert_eq!(store.list("", &mut all).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn cluster_kinds_ignore_namespace() {
        let store: ResourceStore<Namespace> =
            ResourceStore::new(Arc::new(MemoryStore::new()), KeyBuilder::default());
        store.update(&Namespace::new("prod")).await.unwrap();
        assert!(store.get_by_name("whatever", "prod").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn negative_limit_is_not_valid() {
        let mut pred = SelectionPredicate::new(-1);
        assert!(matches!(
            checks().list("default", &mut pred).await,
            Err(StoreError::NotValid(_))
        ));
    }
}
