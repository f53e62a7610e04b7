use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::Method,
    routing::{get, put},
    Extension, Router,
};
use serde::Deserialize;

use super::resources::{create, create_or_replace, destroy, find, list, paths, update};
use super::{JsonBody, KindState, ResourcePath};
use crate::actions::UserController;
use crate::auth::Viewer;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::User;

#[derive(Clone)]
pub struct UserState {
    pub kind: KindState<User>,
    pub passwords: Arc<UserController>,
}

impl FromRef<UserState> for KindState<User> {
    fn from_ref(state: &UserState) -> Self {
        state.kind.clone()
    }
}

impl FromRef<UserState> for Arc<UserController> {
    fn from_ref(state: &UserState) -> Self {
        Arc::clone(&state.passwords)
    }
}

pub fn routes(state: UserState) -> Router {
    let (collection, item) = paths::<User>();
    Router::new()
        .route(&collection, get(list::<User>).post(create::<User>))
        .route(
            &item,
            get(find::<User>)
                .put(create_or_replace::<User>)
                .patch(update::<User>)
                .delete(destroy::<User>),
        )
        .route(&format!("{}/password", item), put(change_password))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub password: String,
}

/// PUT /users/:id/password
pub async fn change_password(
    State(passwords): State<Arc<UserController>>,
    Extension(viewer): Extension<Viewer>,
    method: Method,
    path: ResourcePath,
    JsonBody(body): JsonBody<PasswordChange>,
) -> ApiResult {
    let ctx = path.context::<User>(viewer);
    passwords
        .change_password(&ctx, path.name::<User>(), &body.password)
        .await?;
    Ok(ApiResponse::empty(&method))
}
