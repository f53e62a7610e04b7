//! Action controllers: validate, authorize, and drive the store ports for each
//! resource kind, returning results or tagged errors.

use std::marker::PhantomData;

use crate::auth::Viewer;
use crate::types::{Resource, Scope, User};

pub mod authorization;
pub mod controller;
pub mod entities;
pub mod events;
pub mod users;

pub use controller::Controller;
pub use entities::EntityController;
pub use events::EventController;
pub use users::UserController;

/// Request-scoped inputs every action needs. Built per request, never shared.
#[derive(Debug, Clone)]
pub struct Context {
    /// Namespace from the request path; empty for cluster-scoped routes
    pub namespace: String,
    pub viewer: Viewer,
}

impl Context {
    pub fn new(namespace: impl Into<String>, viewer: Viewer) -> Self {
        Self {
            namespace: namespace.into(),
            viewer,
        }
    }

    pub fn cluster(viewer: Viewer) -> Self {
        Self::new("", viewer)
    }
}

/// Capability predicates for one kind, evaluated fresh for each action call.
pub struct Abilities<'a, T> {
    ctx: &'a Context,
    _kind: PhantomData<fn() -> T>,
}

impl<'a, T: Resource> Abilities<'a, T> {
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            _kind: PhantomData,
        }
    }

    fn scoped<'n>(&self, namespace: &'n str) -> &'n str {
        match T::SCOPE {
            Scope::Namespaced => namespace,
            Scope::Cluster => "",
        }
    }

    fn allows(&self, verb: &str, resource: &T) -> bool {
        self.ctx.viewer.allows(
            verb,
            T::KIND,
            self.scoped(resource.namespace()),
            Some(resource.name()),
        )
    }

    pub fn can_read(&self, resource: &T) -> bool {
        self.allows("get", resource)
    }

    pub fn can_create(&self, resource: &T) -> bool {
        self.allows("create", resource)
    }

    pub fn can_update(&self, resource: &T) -> bool {
        self.allows("update", resource)
    }

    pub fn can_delete(&self) -> bool {
        self.ctx
            .viewer
            .allows("delete", T::KIND, self.scoped(&self.ctx.namespace), None)
    }
}

impl Abilities<'_, User> {
    /// Users may always change their own password
    pub fn can_change_password(&self, user: &User) -> bool {
        self.ctx.viewer.username == user.meta.name || self.can_update(user)
    }
}
