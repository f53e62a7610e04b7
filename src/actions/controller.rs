use std::sync::Arc;

use super::authorization::filter_readable;
use super::{Abilities, Context};
use crate::error::{Error, Result};
use crate::store::{SelectionPredicate, Store};
use crate::types::{DestroyOrder, EmptyName, Resource, Scope};

/// The create/read/update/delete/list algorithm shared by every resource kind.
/// Kind-specific behavior comes from the `Resource` descriptor.
pub struct Controller<T> {
    store: Arc<dyn Store<T>>,
}

impl<T> Clone for Controller<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Resource> Controller<T> {
    pub fn new(store: Arc<dyn Store<T>>) -> Self {
        Self { store }
    }

    fn empty_name() -> Error {
        match T::EMPTY_NAME {
            EmptyName::InvalidArgument => Error::invalid_argument("name is required"),
            EmptyName::NotFound => Error::not_found(),
        }
    }

    /// Pin a namespaced resource to the request namespace
    fn scope(ctx: &Context, resource: &mut T) -> Result<()> {
        if T::SCOPE == Scope::Cluster {
            return Ok(());
        }
        let meta = resource.meta_mut();
        if meta.namespace.is_empty() {
            meta.namespace = ctx.namespace.clone();
        } else if meta.namespace != ctx.namespace {
            return Err(Error::invalid_argument(format!(
                "namespace {:?} does not match the request namespace {:?}",
                meta.namespace, ctx.namespace
            )));
        }
        Ok(())
    }

    async fn fetch(&self, ctx: &Context, name: &str) -> Result<Option<T>> {
        Ok(self.store.get_by_name(&ctx.namespace, name).await?)
    }

    pub async fn find(&self, ctx: &Context, name: &str) -> Result<T> {
        if name.is_empty() {
            return Err(Self::empty_name());
        }
        let resource = self.fetch(ctx, name).await?.ok_or_else(Error::not_found)?;
        if !Abilities::<T>::new(ctx).can_read(&resource) {
            return Err(Error::not_found());
        }
        Ok(resource.redacted())
    }

    /// One page of the collection, minus whatever the viewer may not read.
    /// `pred.continue_token` is left as the store reported it.
    pub async fn list(&self, ctx: &Context, pred: &mut SelectionPredicate) -> Result<Vec<T>> {
        let mut items = self.store.list(&ctx.namespace, pred).await?;
        filter_readable(&mut items, &Abilities::new(ctx));
        Ok(items.into_iter().map(Resource::redacted).collect())
    }

    /// Fails with AlreadyExistsErr when the name is taken. The existence check
    /// and the write are separate store calls; concurrent creates of one name
    /// can both pass the check, and only the store can arbitrate between them.
    pub async fn create(&self, ctx: &Context, mut resource: T) -> Result<()> {
        Self::scope(ctx, &mut resource)?;
        resource.normalize();

        if self.fetch(ctx, resource.name()).await?.is_some() {
            return Err(Error::already_exists());
        }

        resource.validate_all()?;
        if !Abilities::<T>::new(ctx).can_create(&resource) {
            return Err(Error::permission_denied());
        }

        resource.prepare()?;
        self.store.update(&resource).await?;
        tracing::info!(kind = T::KIND, namespace = %resource.namespace(), name = %resource.name(), "created");
        Ok(())
    }

    /// Upsert: no existence check, the stored value is replaced wholesale.
    pub async fn create_or_replace(&self, ctx: &Context, mut resource: T) -> Result<()> {
        Self::scope(ctx, &mut resource)?;
        resource.normalize();
        resource.validate_all()?;

        let abilities = Abilities::<T>::new(ctx);
        if !(abilities.can_create(&resource) && abilities.can_update(&resource)) {
            return Err(Error::permission_denied());
        }

        resource.prepare()?;
        self.store.update(&resource).await?;
        tracing::info!(kind = T::KIND, namespace = %resource.namespace(), name = %resource.name(), "created or replaced");
        Ok(())
    }

    /// Merge the kind's mutable fields from `delta` onto the stored resource.
    pub async fn update(&self, ctx: &Context, mut delta: T) -> Result<T> {
        Self::scope(ctx, &mut delta)?;
        if delta.name().is_empty() {
            return Err(Self::empty_name());
        }

        let mut existing = self
            .fetch(ctx, delta.name())
            .await?
            .ok_or_else(Error::not_found)?;
        if !Abilities::<T>::new(ctx).can_update(&existing) {
            return Err(Error::permission_denied());
        }

        existing.apply_update(delta);
        existing.validate_all()?;
        existing.prepare()?;
        self.store.update(&existing).await?;
        tracing::info!(kind = T::KIND, namespace = %existing.namespace(), name = %existing.name(), "updated");
        Ok(existing.redacted())
    }

    /// Delete by the name the store returned, not the one the caller sent.
    pub async fn destroy(&self, ctx: &Context, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Self::empty_name());
        }
        let abilities = Abilities::<T>::new(ctx);

        if T::DESTROY_ORDER == DestroyOrder::AuthorizeFirst && !abilities.can_delete() {
            return Err(Error::permission_denied());
        }
        let existing = self.fetch(ctx, name).await?.ok_or_else(Error::not_found)?;
        if T::DESTROY_ORDER == DestroyOrder::FetchFirst && !abilities.can_delete() {
            return Err(Error::permission_denied());
        }

        self.store
            .delete_by_name(existing.namespace(), existing.name())
            .await?;
        tracing::info!(kind = T::KIND, namespace = %existing.namespace(), name = %existing.name(), "deleted");
        Ok(())
    }
}
