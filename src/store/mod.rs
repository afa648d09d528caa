//! Store driver seam. The query layer only sees these traits.

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

use async_trait::async_trait;
use bson::Document;
use thiserror::Error;

use crate::query::{FindManyModifiers, FindOneModifiers};

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "mongodb")]
    #[error("MongoDB: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Results of a `find`, fetched when materialized.
#[async_trait]
pub trait DocumentCursor: Send {
    async fn materialize_all(self: Box<Self>) -> StoreResult<Vec<Document>>;
}

/// A document store shared by concurrent invocations.
///
/// Implementations must be safe for concurrent use; the query layer adds no locking.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_collection_names(&self, db: &str) -> StoreResult<Vec<String>>;

    /// Returns `Ok(None)` when no document matches.
    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        modifiers: &FindOneModifiers,
    ) -> StoreResult<Option<Document>>;

    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        modifiers: &FindManyModifiers,
    ) -> StoreResult<Box<dyn DocumentCursor>>;

    /// Connectivity check used once at startup.
    async fn ping(&self) -> StoreResult<()>;
}
