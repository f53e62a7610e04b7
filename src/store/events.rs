use async_trait::async_trait;

use super::{ResourceStore, SelectionPredicate, Store, StoreError};
use crate::types::Event;

/// Event-specific lookups on top of the generic port. Events are stored
/// under `<entity>/<check>`, so an entity's events form one subcollection.
#[async_trait]
pub trait EventStore: Store<Event> {
    /// Every event of one entity; walks all pages.
    async fn list_events_by_entity(&self, namespace: &str, entity: &str) -> Result<Vec<Event>, StoreError> {
        let mut pred = SelectionPredicate::default().with_subcollection(entity);
        let mut events = Vec::new();
        loop {
            events.extend(self.list(namespace, &mut pred).await?);
            if !pred.has_more() {
                return Ok(events);
            }
        }
    }

    async fn get_event_by_entity_check(
        &self,
        namespace: &str,
        entity: &str,
        check: &str,
    ) -> Result<Option<Event>, StoreError> {
        self.get_by_name(namespace, &Event::key_name(entity, check)).await
    }

    async fn delete_event_by_entity_check(
        &self,
        namespace: &str,
        entity: &str,
        check: &str,
    ) -> Result<(), StoreError> {
        self.delete_by_name(namespace, &Event::key_name(entity, check)).await
    }
}

impl EventStore for ResourceStore<Event> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyBuilder, MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn events_are_grouped_by_entity() {
        let store: ResourceStore<Event> =
            ResourceStore::new(Arc::new(MemoryStore::new()), KeyBuilder::default());
        for (entity, check) in [("web", "cpu"), ("web", "disk"), ("web-2", "cpu"), ("db", "cpu")] {
            store.update(&Event::fixture("default", entity, check)).await.unwrap();
        }

        let web = store.list_events_by_entity("default", "web").await.unwrap();
        let checks: Vec<_> = web.iter().filter_map(|e| e.check_name()).collect();
        assert_eq!(checks, vec!["cpu", "disk"]);

        assert!(store
            .get_event_by_entity_check("default", "db", "cpu")
            .await
            .unwrap()
            .is_some());
        store.delete_event_by_entity_check("default", "db", "cpu").await.unwrap();
        assert!(store.list_events_by_entity("default", "db").await.unwrap().is_empty());
    }
}
