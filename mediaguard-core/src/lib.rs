//! MediaGuard Core - content identification engine
//!
//! This crate decides whether a piece of media has been seen before, under
//! which identity, and with which algorithm-specific digests. It provides:
//!
//! - Pluggable hashing and watermarking algorithms behind [`Hasher`] and
//!   [`Watermarker`], collected in explicit registries
//! - Dedup-aware ingestion that only computes missing digests
//! - Content and digest queries that only return resolvable matches
//! - Watermark embedding with an append-only history per identity
//!
//! Persistence sits behind [`ContentIdentityStore`]; [`MemoryIdentityStore`]
//! is bundled for tests and development.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mediaguard_core::hashing::sha256::{Sha256Hasher, ALGORITHM_SHA256};
//! use mediaguard_core::{
//!     AlgorithmSelection, HashOrchestrator, HashingRegistry, MediaFile, MemoryIdentityStore,
//!     QueryEngine,
//! };
//!
//! # async fn example() -> mediaguard_core::Result<()> {
//! let mut registry = HashingRegistry::hashing();
//! registry.register(ALGORITHM_SHA256, Arc::new(Sha256Hasher))?;
//! let registry = Arc::new(registry);
//! let store = Arc::new(MemoryIdentityStore::new());
//!
//! let ingest = HashOrchestrator::new(registry.clone(), store.clone());
//! let media = MediaFile::new(b"Hello World".to_vec(), "hello.txt");
//! let outcome = ingest
//!     .ensure_hashes(&media, &[AlgorithmSelection::named(ALGORITHM_SHA256)])
//!     .await?;
//!
//! let query = QueryEngine::new(registry, store);
//! let matches = query.query_by_content(b"Hello World", &[]).await?;
//! assert_eq!(matches[0].content_id, Some(outcome.content_id));
//! # Ok(())
//! # }
//! ```

pub mod digest;
pub mod embed;
pub mod error;
pub mod hashing;
pub mod ingest;
pub mod model;
pub mod query;
pub mod registry;
pub mod store;
pub mod watermarking;

#[cfg(feature = "media-tools")]
mod external;

pub use digest::{primary_digest, PRIMARY_DIGEST_ALGORITHM};
pub use embed::WatermarkOrchestrator;
pub use error::{MediaGuardError, Result};
pub use hashing::Hasher;
pub use ingest::HashOrchestrator;
pub use model::{
    normalize_similarity, AlgorithmDescriptor, AlgorithmSelection, Capability, ContentId,
    ContentRecord, Digests, HashOutcome, MediaFile, SimilarityResult, WatermarkHistoryEntry,
    WatermarkOutcome, EXACT_MATCH_SIMILARITY,
};
pub use query::QueryEngine;
pub use registry::{AlgorithmInfo, AlgorithmRegistry, HashingRegistry, WatermarkingRegistry};
pub use store::{ContentIdentityStore, MemoryIdentityStore, StoreError, StoreResult};
pub use watermarking::Watermarker;

#[cfg(feature = "network")]
pub use hashing::descriptor::{DescriptorConfig, DescriptorHasher, ALGORITHM_VT};
pub use hashing::sha256::{Sha256Hasher, ALGORITHM_SHA256};
#[cfg(feature = "media-tools")]
pub use watermarking::metadata::{MetadataWatermarkConfig, MetadataWatermarker, ALGORITHM_BASIC};
