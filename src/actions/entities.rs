use std::sync::Arc;

use super::{Abilities, Context};
use crate::error::{Error, Result};
use crate::store::{EventStore, Store};
use crate::types::{Entity, Resource};

/// Entity removal, which also sweeps the entity's events.
///
/// The sweep is best effort and not transactional: events go first, one at a
/// time, and a failed event delete is logged and skipped. Only the event
/// listing and the entity fetch/delete can fail the request. Events already
/// removed stay removed if the entity delete then fails.
pub struct EntityController {
    entities: Arc<dyn Store<Entity>>,
    events: Arc<dyn EventStore>,
}

impl EntityController {
    pub fn new(entities: Arc<dyn Store<Entity>>, events: Arc<dyn EventStore>) -> Self {
        Self { entities, events }
    }

    pub async fn destroy(&self, ctx: &Context, name: &str) -> Result<Entity> {
        if name.is_empty() {
            return Err(Error::invalid_argument("entity name is required"));
        }
        if !Abilities::<Entity>::new(ctx).can_delete() {
            return Err(Error::permission_denied());
        }
        let namespace = ctx.namespace.as_str();

        let events = self.events.list_events_by_entity(namespace, name).await?;
        for event in events.iter().filter(|e| e.has_check()) {
            let check = event.check_name().unwrap_or_default();
            if let Err(err) = self
                .events
                .delete_event_by_entity_check(namespace, name, check)
                .await
            {
                tracing::warn!(
                    entity = %name,
                    check = %check,
                    namespace = %namespace,
                    error = %err,
                    "failed to delete event, continuing"
                );
            }
        }

        let entity = self
            .entities
            .get_by_name(namespace, name)
            .await?
            .ok_or_else(Error::not_found)?;
        self.entities
            .delete_by_name(entity.namespace(), entity.name())
            .await?;

        tracing::info!(
            namespace = %entity.namespace(),
            name = %entity.name(),
            events = events.len(),
            "deleted entity"
        );
        Ok(entity.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::*;
    use crate::error::ErrCode;
    use crate::store::{KeyBuilder, MemoryStore, ResourceStore, SelectionPredicate, StoreError};
    use crate::types::Event;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    /// Event store whose deletes fail for one stored name
    struct FlakyEvents {
        inner: ResourceStore<Event>,
        fail_on: String,
    }

    #[async_trait]
    impl Store<Event> for FlakyEvents {
        async fn get_by_name(&self, namespace: &str, name: &str) -> Result<Option<Event>, StoreError> {
            self.inner.get_by_name(namespace, name).await
        }

        async fn list(&self, namespace: &str, pred: &mut SelectionPredicate) -> Result<Vec<Event>, StoreError> {
            self.inner.list(namespace, pred).await
        }

        async fn update(&self, resource: &Event) -> Result<(), StoreError> {
            self.inner.update(resource).await
        }

        async fn delete_by_name(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
            if name == self.fail_on {
                return Err(StoreError::Internal("connection reset".to_string()));
            }
            self.inner.delete_by_name(namespace, name).await
        }
    }

    impl EventStore for FlakyEvents {}

    /// Event store whose listing always fails
    struct BrokenEvents;

    #[async_trait]
    impl Store<Event> for BrokenEvents {
        async fn get_by_name(&self, _: &str, _: &str) -> Result<Option<Event>, StoreError> {
            Ok(None)
        }

        async fn list(&self, _: &str, _: &mut SelectionPredicate) -> Result<Vec<Event>, StoreError> {
            Err(StoreError::Internal("unavailable".to_string()))
        }

        async fn update(&self, _: &Event) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_by_name(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    impl EventStore for BrokenEvents {}

    struct Fixture {
        entities: ResourceStore<Entity>,
        events: ResourceStore<Event>,
    }

    async fn seeded() -> Fixture {
        let kv = Arc::new(MemoryStore::new());
        let fixture = Fixture {
            entities: ResourceStore::new(kv.clone(), KeyBuilder::default()),
            events: ResourceStore::new(kv, KeyBuilder::default()),
        };
        fixture
            .entities
            .update(&Entity::fixture("default", "web-1"))
            .await
            .unwrap();
        for check in ["cpu", "disk", "mem"] {
            fixture
                .events
                .update(&Event::fixture("default", "web-1", check))
                .await
                .unwrap();
        }
        fixture
    }

    #[tokio::test]
    async fn deletes_events_then_entity() {
        let fixture = seeded().await;
        fixture
            .events
            .update(&Event::fixture("default", "web-10", "cpu"))
            .await
            .unwrap();
        let controller = EntityController::new(
            Arc::new(fixture.entities.clone()),
            Arc::new(fixture.events.clone()),
        );

        let deleted = controller.destroy(&admin(), "web-1").await.unwrap();
        assert_eq!(deleted.meta.name, "web-1");
        assert!(fixture.entities.get_by_name("default", "web-1").await.unwrap().is_none());
        assert!(fixture.events.list_events_by_entity("default", "web-1").await.unwrap().is_empty());
        // a neighbour sharing the name prefix is untouched
        assert_eq!(fixture.events.list_events_by_entity("default", "web-10").await.unwrap().len(), 1);
    }

    /// Collects the rendered fields of every WARN event
    #[derive(Clone, Default)]
    struct WarningCapture {
        warnings: Arc<Mutex<Vec<String>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarningCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                let mut visitor = FieldVisitor(String::new());
                event.record(&mut visitor);
                self.warnings.lock().unwrap().push(visitor.0);
            }
        }
    }

    struct FieldVisitor(String);
    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push_str(&format!("{}={:?} ", field.name(), value));
        }
    }

    #[tokio::test]
    async fn event_failures_are_logged_and_skipped() {
        let capture = WarningCapture::default();
        let warnings = capture.warnings.clone();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture));

        let fixture = seeded().await;
        let events = FlakyEvents {
            inner: fixture.events.clone(),
            fail_on: Event::key_name("web-1", "disk"),
        };
        let controller = EntityController::new(Arc::new(fixture.entities.clone()), Arc::new(events));

        let deleted = controller.destroy(&admin(), "web-1").await.unwrap();
        assert_eq!(deleted.meta.name, "web-1");
        assert!(fixture.entities.get_by_name("default", "web-1").await.unwrap().is_none());

        let left: Vec<_> = fixture
            .events
            .list_events_by_entity("default", "web-1")
            .await
            .unwrap()
            .into_iter()
            .filter_map(|e| e.check_name().map(str::to_string))
            .collect();
        assert_eq!(left, vec!["disk"]);

        let captured = warnings.lock().unwrap();
        let failures: Vec<_> = captured
            .iter()
            .filter(|w| w.contains("failed to delete event"))
            .collect();
        assert_eq!(failures.len(), 1, "{:?}", *captured);
        assert!(failures[0].contains("connection reset"));
        assert!(failures[0].contains("check=disk"));
    }

    #[tokio::test]
    async fn missing_entity_is_not_found_after_the_sweep() {
        let fixture = seeded().await;
        fixture.entities.delete_by_name("default", "web-1").await.unwrap();
        let controller = EntityController::new(
            Arc::new(fixture.entities.clone()),
            Arc::new(fixture.events.clone()),
        );

        let err = controller.destroy(&admin(), "web-1").await.unwrap_err();
        assert_eq!(err.code, ErrCode::NotFound);
        // orphaned events were still swept
        assert!(fixture.events.list_events_by_entity("default", "web-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_failure_aborts_before_touching_the_entity() {
        let fixture = seeded().await;
        let controller = EntityController::new(Arc::new(fixture.entities.clone()), Arc::new(BrokenEvents));

        let err = controller.destroy(&admin(), "web-1").await.unwrap_err();
        assert_eq!(err.code, ErrCode::InternalErr);
        assert!(fixture.entities.get_by_name("default", "web-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unauthorized_callers_delete_nothing() {
        let fixture = seeded().await;
        let controller = EntityController::new(
            Arc::new(fixture.entities.clone()),
            Arc::new(fixture.events.clone()),
        );
        let reader = viewer_with("default", "alice", vec![rule("default", &["get"], &["entities", "events"])]);

        let err = controller.destroy(&reader, "web-1").await.unwrap_err();
        assert_eq!(err.code, ErrCode::PermissionDenied);
        assert_eq!(fixture.events.list_events_by_entity("default", "web-1").await.unwrap().len(), 3);

        let err = controller.destroy(&admin(), "").await.unwrap_err();
        assert_eq!(err.code, ErrCode::InvalidArgument);
    }
}
