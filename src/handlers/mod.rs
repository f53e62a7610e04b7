//! HTTP bindings: one route per action, all sharing the same adapters.
//!
//! Namespaced kinds live under `/namespaces/:namespace/<kind>`, cluster kinds
//! at `/<kind>`. Bodies and path parameters are decoded here; failures to do so
//! are reported through the same `{message, code}` body as action errors.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::actions::{Context, Controller};
use crate::auth::Viewer;
use crate::config::ApiConfig;
use crate::error::Error;
use crate::pager::ListQuery;
use crate::types::{Namespace, Resource, Scope};

pub mod entities;
pub mod events;
pub mod resources;
pub mod users;

/// Router state for the generic resource routes of one kind
pub struct KindState<T> {
    pub controller: Controller<T>,
    pub api: Arc<ApiConfig>,
}

impl<T> Clone for KindState<T> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            api: Arc::clone(&self.api),
        }
    }
}

/// Path parameters of the matched route
#[derive(Debug, Default)]
pub struct ResourcePath {
    params: HashMap<String, String>,
}

impl ResourcePath {
    pub fn get(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Request namespace; always empty for cluster-scoped kinds
    pub fn namespace<T: Resource>(&self) -> &str {
        match T::SCOPE {
            Scope::Namespaced => self.get("namespace"),
            Scope::Cluster => "",
        }
    }

    /// Name of the addressed resource.
    /// `/namespaces/:namespace` doubles as the item route of the namespace kind.
    pub fn name<T: Resource>(&self) -> &str {
        if T::KIND == Namespace::KIND {
            self.get("namespace")
        } else {
            self.get("id")
        }
    }

    pub fn context<T: Resource>(&self, viewer: Viewer) -> Context {
        Context::new(self.namespace::<T>(), viewer)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ResourcePath {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<HashMap<String, String>>::from_request_parts(parts, state).await {
            Ok(Path(params)) => Ok(Self { params }),
            Err(PathRejection::MissingPathParams(_)) => Ok(Self::default()),
            Err(e) => Err(Error::invalid_argument(e.body_text())),
        }
    }
}

/// JSON request body; decode failures are InvalidArgument
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|e: JsonRejection| Error::invalid_argument(e.body_text()))
    }
}

/// `limit` and `continue` query parameters of a list call
pub struct ListParams(pub ListQuery);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ListParams {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Query::<ListQuery>::try_from_uri(&parts.uri)
            .map(|Query(query)| Self(query))
            .map_err(|e| Error::invalid_argument(e.body_text()))
    }
}
