use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, Method},
    routing::get,
    Extension, Router,
};

use super::{JsonBody, ListParams, ResourcePath};
use crate::actions::EventController;
use crate::auth::Viewer;
use crate::config::ApiConfig;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pager::predicate_from_request;
use crate::types::Event;

#[derive(Clone)]
pub struct EventState {
    pub controller: Arc<EventController>,
    pub api: Arc<ApiConfig>,
}

impl FromRef<EventState> for Arc<EventController> {
    fn from_ref(state: &EventState) -> Self {
        Arc::clone(&state.controller)
    }
}

/// Events are addressed by entity and check:
///
/// - `/namespaces/:namespace/events`: list all, create
/// - `/namespaces/:namespace/events/:entity`: list one entity's events
/// - `/namespaces/:namespace/events/:entity/:check`: find, replace, delete
pub fn routes(state: EventState) -> Router {
    Router::new()
        .route("/namespaces/:namespace/events", get(list).post(create))
        .route("/namespaces/:namespace/events/:entity", get(list))
        .route(
            "/namespaces/:namespace/events/:entity/:check",
            get(find).put(create_or_replace).delete(destroy),
        )
        .with_state(state)
}

pub async fn list(
    State(state): State<EventState>,
    Extension(viewer): Extension<Viewer>,
    path: ResourcePath,
    headers: HeaderMap,
    ListParams(query): ListParams,
) -> ApiResult {
    let ctx = path.context::<Event>(viewer);
    let entity = Some(path.get("entity")).filter(|e| !e.is_empty());
    let mut pred = predicate_from_request(&headers, &query, None, &state.api)?;
    let events = state.controller.list(&ctx, entity, &mut pred).await?;
    ApiResponse::page(events, &pred)
}

pub async fn find(
    State(controller): State<Arc<EventController>>,
    Extension(viewer): Extension<Viewer>,
    path: ResourcePath,
) -> ApiResult {
    let ctx = path.context::<Event>(viewer);
    ApiResponse::ok(controller.find(&ctx, path.get("entity"), path.get("check")).await?)
}

pub async fn create(
    State(controller): State<Arc<EventController>>,
    Extension(viewer): Extension<Viewer>,
    method: Method,
    path: ResourcePath,
    JsonBody(event): JsonBody<Event>,
) -> ApiResult {
    let ctx = path.context::<Event>(viewer);
    controller.create(&ctx, event).await?;
    Ok(ApiResponse::empty(&method))
}

pub async fn create_or_replace(
    State(controller): State<Arc<EventController>>,
    Extension(viewer): Extension<Viewer>,
    method: Method,
    path: ResourcePath,
    JsonBody(event): JsonBody<Event>,
) -> ApiResult {
    let ctx = path.context::<Event>(viewer);
    controller
        .create_or_replace(&ctx, path.get("entity"), path.get("check"), event)
        .await?;
    Ok(ApiResponse::empty(&method))
}

pub async fn destroy(
    State(controller): State<Arc<EventController>>,
    Extension(viewer): Extension<Viewer>,
    method: Method,
    path: ResourcePath,
) -> ApiResult {
    let ctx = path.context::<Event>(viewer);
    controller
        .destroy(&ctx, path.get("entity"), path.get("check"))
        .await?;
    Ok(ApiResponse::empty(&method))
}
