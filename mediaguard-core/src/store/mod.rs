//! Content identity persistence.
//!
//! The store owns every persisted entity: identities keyed by primary
//! digest, one digest per (identity, algorithm) pair and the append-only
//! watermark history. Orchestrators hold no state of their own and re-read
//! the store on every call, so consistency between concurrent callers is
//! entirely the store's job (uniqueness constraints, not locks).

mod memory;

pub use memory::MemoryIdentityStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ContentId, ContentRecord, Digests, WatermarkHistoryEntry};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait ContentIdentityStore: Send + Sync {
    async fn find_identity_by_primary_digest(
        &self,
        primary_digest: &str,
    ) -> StoreResult<Option<ContentId>>;

    /// Create the identity for `primary_digest`, or return the existing one.
    ///
    /// Concurrent callers with the same digest converge on one identity.
    async fn create_identity(
        &self,
        primary_digest: &str,
        display_name: &str,
        media_kind: &str,
    ) -> StoreResult<ContentId>;

    async fn get_content(&self, id: ContentId) -> StoreResult<Option<ContentRecord>>;

    async fn list_digests(&self, id: ContentId) -> StoreResult<Digests>;

    /// Record `digest` for (`id`, `algorithm`) unless a digest is already
    /// recorded for that pair. An existing record is left untouched.
    async fn insert_digest_if_absent(
        &self,
        id: ContentId,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<()>;

    async fn find_identity_by_algorithm_digest(
        &self,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<Option<ContentId>>;

    async fn append_watermark_history(
        &self,
        id: ContentId,
        algorithm: &str,
        post_digest: &str,
    ) -> StoreResult<()>;

    /// History of `id`, oldest first.
    async fn list_watermark_history(
        &self,
        id: ContentId,
    ) -> StoreResult<Vec<WatermarkHistoryEntry>>;

    /// Earliest history entry whose watermarked output has `post_digest`.
    async fn find_identity_by_watermark_digest(
        &self,
        post_digest: &str,
    ) -> StoreResult<Option<WatermarkHistoryEntry>>;
}
