use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::actions::{Controller, EntityController, EventController, UserController};
use crate::config::{AppConfig, SecurityConfig, StoreBackend};
use crate::handlers::{entities, events, resources, users, KindState};
use crate::middleware::authenticate;
use crate::store::{KeyBuilder, KeyValueStore, MemoryStore, PgStore, ResourceStore, StoreError};
use crate::types::{
    Asset, CheckConfig, ClusterRole, ClusterRoleBinding, Entity, Event, EventFilter, Handler, HookConfig,
    Mutator, Namespace, Resource, Role, RoleBinding, Silenced, User,
};

/// Everything a request needs, shared across the server
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    kv: Arc<dyn KeyValueStore>,
    keys: KeyBuilder,
}

impl AppState {
    pub fn new(config: AppConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        let keys = KeyBuilder::new(config.store.key_prefix.clone());
        Self {
            config: Arc::new(config),
            kv,
            keys,
        }
    }

    /// Open the configured backend; Postgres is migrated before use
    pub async fn connect(config: AppConfig) -> Result<Self, StoreError> {
        let kv: Arc<dyn KeyValueStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Postgres => {
                Arc::new(PgStore::connect(&config.store).await?)
            }
        };
        tracing::info!(backend = ?config.store.backend, prefix = %config.store.key_prefix, "store ready");
        Ok(Self::new(config, kv))
    }

    pub fn store<T: Resource>(&self) -> ResourceStore<T> {
        ResourceStore::new(Arc::clone(&self.kv), self.keys.clone())
    }

    pub fn controller<T: Resource>(&self) -> Controller<T> {
        Controller::new(Arc::new(self.store::<T>()))
    }

    fn kind<T: Resource>(&self) -> KindState<T> {
        KindState {
            controller: self.controller::<T>(),
            api: Arc::new(self.config.api.clone()),
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.kv.ping().await
    }
}

pub fn app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let security = Arc::new(config.security.clone());

    let api = Router::new()
        .merge(resources::routes(state.kind::<CheckConfig>()))
        .merge(resources::routes(state.kind::<Handler>()))
        .merge(resources::routes(state.kind::<EventFilter>()))
        .merge(resources::routes(state.kind::<Mutator>()))
        .merge(resources::routes(state.kind::<Asset>()))
        .merge(resources::routes(state.kind::<HookConfig>()))
        .merge(resources::routes(state.kind::<Silenced>()))
        .merge(resources::routes(state.kind::<Role>()))
        .merge(resources::routes(state.kind::<RoleBinding>()))
        .merge(resources::routes(state.kind::<ClusterRole>()))
        .merge(resources::routes(state.kind::<ClusterRoleBinding>()))
        .merge(resources::routes(state.kind::<Namespace>()))
        .merge(entity_routes(&state))
        .merge(event_routes(&state))
        .merge(user_routes(&state))
        .layer(from_fn_with_state(Arc::clone(&security), authenticate));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
        .merge(api)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if security.enable_cors {
        router = router.layer(cors(&security));
    }
    router
}

fn entity_routes(state: &AppState) -> Router {
    let cascade = EntityController::new(
        Arc::new(state.store::<Entity>()),
        Arc::new(state.store::<Event>()),
    );
    entities::routes(entities::EntityState {
        kind: state.kind(),
        cascade: Arc::new(cascade),
    })
}

fn event_routes(state: &AppState) -> Router {
    let controller = EventController::new(state.controller(), Arc::new(state.store::<Event>()));
    events::routes(events::EventState {
        controller: Arc::new(controller),
        api: Arc::new(state.config.api.clone()),
    })
}

fn user_routes(state: &AppState) -> Router {
    users::routes(users::UserState {
        kind: state.kind(),
        passwords: Arc::new(UserController::new(Arc::new(state.store::<User>()))),
    })
}

fn cors(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, crate::pager::CONTINUE_HEADER])
        .expose_headers([crate::pager::CONTINUE_HEADER])
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                })),
            )
        }
    }
}
