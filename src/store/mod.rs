//! Store ports: the typed get/list/put/delete contract the controllers code against,
//! and the key-value backends behind it.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Resource;

pub mod events;
pub mod kv;
pub mod memory;
pub mod postgres;
pub mod resource;

pub use events::EventStore;
pub use kv::{KeyBuilder, KeyValueStore, Page};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use resource::ResourceStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("key already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotValid(String),

    #[error("internal store error: {0}")]
    Internal(String),

    #[error("could not decode value at {key}: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Paging and narrowing input for list calls.
///
/// `continue_token` is owned by the store: an empty token starts at the
/// beginning of the collection, and a non-empty token left behind after a
/// list call means more data may exist. Callers pass it through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPredicate {
    pub continue_token: String,
    /// Page size; 0 means unlimited
    pub limit: i64,
    /// Narrows the listing to one child collection, e.g. the events of one entity
    pub subcollection: String,
}

impl SelectionPredicate {
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn with_continue(mut self, token: impl Into<String>) -> Self {
        self.continue_token = token.into();
        self
    }

    pub fn with_subcollection(mut self, subcollection: impl Into<String>) -> Self {
        self.subcollection = subcollection.into();
        self
    }

    pub fn has_more(&self) -> bool {
        !self.continue_token.is_empty()
    }
}

/// Typed store port for one resource kind.
///
/// `namespace` is ignored for cluster-scoped kinds. `list` consumes
/// `pred.continue_token` and replaces it with the token for the next page.
#[async_trait]
pub trait Store<T: Resource>: Send + Sync {
    async fn get_by_name(&self, namespace: &str, name: &str) -> Result<Option<T>, StoreError>;

    async fn list(&self, namespace: &str, pred: &mut SelectionPredicate) -> Result<Vec<T>, StoreError>;

    /// Create or overwrite
    async fn update(&self, resource: &T) -> Result<(), StoreError>;

    async fn delete_by_name(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
}
