use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    routing::get,
    Extension, Router,
};

use super::resources::{create, create_or_replace, find, list, paths, update};
use super::{KindState, ResourcePath};
use crate::actions::EntityController;
use crate::auth::Viewer;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Entity;

#[derive(Clone)]
pub struct EntityState {
    pub kind: KindState<Entity>,
    pub cascade: Arc<EntityController>,
}

impl FromRef<EntityState> for KindState<Entity> {
    fn from_ref(state: &EntityState) -> Self {
        state.kind.clone()
    }
}

impl FromRef<EntityState> for Arc<EntityController> {
    fn from_ref(state: &EntityState) -> Self {
        Arc::clone(&state.cascade)
    }
}

/// Standard entity routes, except DELETE also removes the entity's events
pub fn routes(state: EntityState) -> Router {
    let (collection, item) = paths::<Entity>();
    Router::new()
        .route(&collection, get(list::<Entity>).post(create::<Entity>))
        .route(
            &item,
            get(find::<Entity>)
                .put(create_or_replace::<Entity>)
                .patch(update::<Entity>)
                .delete(destroy),
        )
        .with_state(state)
}

/// DELETE /namespaces/:namespace/entities/:id - responds with the deleted entity
pub async fn destroy(
    State(cascade): State<Arc<EntityController>>,
    Extension(viewer): Extension<Viewer>,
    path: ResourcePath,
) -> ApiResult {
    let ctx = path.context::<Entity>(viewer);
    ApiResponse::ok(cascade.destroy(&ctx, path.name::<Entity>()).await?)
}
