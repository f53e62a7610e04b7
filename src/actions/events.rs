use std::sync::Arc;

use super::authorization::filter_readable;
use super::{Abilities, Context, Controller};
use crate::error::{Error, Result};
use crate::store::{EventStore, SelectionPredicate};
use crate::types::{Event, Resource};

/// Events are addressed by `(entity, check)` rather than by a single name.
pub struct EventController {
    generic: Controller<Event>,
    events: Arc<dyn EventStore>,
}

fn require_path(entity: &str, check: &str) -> Result<()> {
    if entity.is_empty() {
        return Err(Error::invalid_argument("entity name is required"));
    }
    if check.is_empty() {
        return Err(Error::invalid_argument("check name is required"));
    }
    Ok(())
}

impl EventController {
    pub fn new(generic: Controller<Event>, events: Arc<dyn EventStore>) -> Self {
        Self { generic, events }
    }

    pub async fn find(&self, ctx: &Context, entity: &str, check: &str) -> Result<Event> {
        require_path(entity, check)?;
        let event = self
            .events
            .get_event_by_entity_check(&ctx.namespace, entity, check)
            .await?
            .ok_or_else(Error::not_found)?;
        if !Abilities::<Event>::new(ctx).can_read(&event) {
            return Err(Error::not_found());
        }
        Ok(event)
    }

    /// One page of events, optionally narrowed to a single entity
    pub async fn list(
        &self,
        ctx: &Context,
        entity: Option<&str>,
        pred: &mut SelectionPredicate,
    ) -> Result<Vec<Event>> {
        match entity {
            Some("") => return Err(Error::invalid_argument("entity name is required")),
            Some(entity) => pred.subcollection = entity.to_string(),
            None => {}
        }
        let mut events = self.events.list(&ctx.namespace, pred).await?;
        filter_readable(&mut events, &Abilities::new(ctx));
        Ok(events)
    }

    pub async fn create(&self, ctx: &Context, event: Event) -> Result<()> {
        self.generic.create(ctx, event).await
    }

    /// Replace the event at `entity/check`; the body must name the same pair.
    pub async fn create_or_replace(
        &self,
        ctx: &Context,
        entity: &str,
        check: &str,
        event: Event,
    ) -> Result<()> {
        require_path(entity, check)?;
        if event.entity_name() != entity || event.check_name() != Some(check) {
            return Err(Error::invalid_argument(format!(
                "event body does not match {}",
                Event::key_name(entity, check)
            )));
        }
        self.generic.create_or_replace(ctx, event).await
    }

    pub async fn destroy(&self, ctx: &Context, entity: &str, check: &str) -> Result<()> {
        require_path(entity, check)?;
        if !Abilities::<Event>::new(ctx).can_delete() {
            return Err(Error::permission_denied());
        }
        let event = self
            .events
            .get_event_by_entity_check(&ctx.namespace, entity, check)
            .await?
            .ok_or_else(Error::not_found)?;
        self.events
            .delete_by_name(event.namespace(), event.name())
            .await?;
        tracing::info!(namespace = %event.namespace(), name = %event.name(), "deleted event");
        Ok(())
    }
}
