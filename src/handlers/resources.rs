use axum::{
    extract::State,
    http::{HeaderMap, Method},
    routing::get,
    Extension, Router,
};

use super::{JsonBody, KindState, ListParams, ResourcePath};
use crate::auth::Viewer;
use crate::error::Error;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pager::predicate_from_request;
use crate::types::{Namespace, Resource, Scope};

/// Collection and item paths for a kind
pub fn paths<T: Resource>() -> (String, String) {
    match T::SCOPE {
        Scope::Namespaced => {
            let collection = format!("/namespaces/:namespace/{}", T::KIND);
            let item = format!("{}/:id", collection);
            (collection, item)
        }
        Scope::Cluster if T::KIND == Namespace::KIND => {
            ("/namespaces".to_string(), "/namespaces/:namespace".to_string())
        }
        Scope::Cluster => (format!("/{}", T::KIND), format!("/{}/:id", T::KIND)),
    }
}

/// The five standard bindings plus PATCH for one kind
pub fn routes<T: Resource>(state: KindState<T>) -> Router {
    let (collection, item) = paths::<T>();
    Router::new()
        .route(&collection, get(list::<T>).post(create::<T>))
        .route(
            &item,
            get(find::<T>)
                .put(create_or_replace::<T>)
                .patch(update::<T>)
                .delete(destroy::<T>),
        )
        .with_state(state)
}

/// The path names the resource; a body may repeat that name but not contradict it
fn bind_name<T: Resource>(path: &ResourcePath, resource: &mut T) -> Result<(), Error> {
    let name = path.name::<T>();
    let meta = resource.meta_mut();
    if meta.name.is_empty() {
        meta.name = name.to_string();
    }
    require_path_name(path, resource)
}

fn require_path_name<T: Resource>(path: &ResourcePath, resource: &T) -> Result<(), Error> {
    let name = path.name::<T>();
    if resource.name() != name {
        return Err(Error::invalid_argument(format!(
            "name {:?} in the body does not match {:?} in the path",
            resource.name(),
            name
        )));
    }
    Ok(())
}

pub async fn list<T: Resource>(
    State(state): State<KindState<T>>,
    Extension(viewer): Extension<Viewer>,
    path: ResourcePath,
    headers: HeaderMap,
    ListParams(query): ListParams,
) -> ApiResult {
    let ctx = path.context::<T>(viewer);
    let mut pred = predicate_from_request(&headers, &query, None, &state.api)?;
    let items = state.controller.list(&ctx, &mut pred).await?;
    ApiResponse::page(items, &pred)
}

pub async fn find<T: Resource>(
    State(state): State<KindState<T>>,
    Extension(viewer): Extension<Viewer>,
    path: ResourcePath,
) -> ApiResult {
    let ctx = path.context::<T>(viewer);
    ApiResponse::ok(state.controller.find(&ctx, path.name::<T>()).await?)
}

pub async fn create<T: Resource>(
    State(state): State<KindState<T>>,
    Extension(viewer): Extension<Viewer>,
    method: Method,
    path: ResourcePath,
    JsonBody(resource): JsonBody<T>,
) -> ApiResult {
    let ctx = path.context::<T>(viewer);
    state.controller.create(&ctx, resource).await?;
    Ok(ApiResponse::empty(&method))
}

pub async fn create_or_replace<T: Resource>(
    State(state): State<KindState<T>>,
    Extension(viewer): Extension<Viewer>,
    method: Method,
    path: ResourcePath,
    JsonBody(mut resource): JsonBody<T>,
) -> ApiResult {
    bind_name(&path, &mut resource)?;
    // Some kinds derive their name from the body
    resource.normalize();
    require_path_name(&path, &resource)?;
    let ctx = path.context::<T>(viewer);
    state.controller.create_or_replace(&ctx, resource).await?;
    Ok(ApiResponse::empty(&method))
}

pub async fn update<T: Resource>(
    State(state): State<KindState<T>>,
    Extension(viewer): Extension<Viewer>,
    path: ResourcePath,
    JsonBody(mut delta): JsonBody<T>,
) -> ApiResult {
    bind_name(&path, &mut delta)?;
    let ctx = path.context::<T>(viewer);
    ApiResponse::ok(state.controller.update(&ctx, delta).await?)
}

pub async fn destroy<T: Resource>(
    State(state): State<KindState<T>>,
    Extension(viewer): Extension<Viewer>,
    method: Method,
    path: ResourcePath,
) -> ApiResult {
    let ctx = path.context::<T>(viewer);
    state.controller.destroy(&ctx, path.name::<T>()).await?;
    Ok(ApiResponse::empty(&method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CheckConfig, ClusterRole, User};

    #[test]
    fn route_templates() {
        assert_eq!(
            paths::<CheckConfig>(),
            (
                "/namespaces/:namespace/checks".to_string(),
                "/namespaces/:namespace/checks/:id".to_string()
            )
        );
        assert_eq!(paths::<User>(), ("/users".to_string(), "/users/:id".to_string()));
        assert_eq!(paths::<ClusterRole>().1, "/clusterroles/:id");
        assert_eq!(paths::<Namespace>().1, "/namespaces/:namespace");
    }
}
