//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod files;
pub mod hashes;
pub mod health;
pub mod query;
pub mod watermarks;

use serde::Serialize;
use utoipa::ToSchema;

use mediaguard_core::AlgorithmDescriptor;

pub use crate::state::AppState;
pub use files::{get_file_handler, FileResponse, WatermarkHistoryItem};
pub use hashes::{
    create_hashes_handler, list_hash_algorithms_handler, HashAlgorithmConfig, HashConfig,
    HashResponse,
};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use query::{
    query_by_hash_handler, query_by_media_handler, DigestQueryRequest, MediaQueryConfig,
    SimilarityMatch,
};
pub use watermarks::{
    embed_watermark_handler, extract_watermark_handler, list_watermark_algorithms_handler,
    trace_origin_handler, OriginResponse, WatermarkConfig, WatermarkResponse,
};

/// One registered algorithm
#[derive(Serialize, ToSchema)]
pub struct AlgorithmEntry {
    #[schema(example = "sha256")]
    pub name: String,
    #[schema(example = "SHA-256 digest of the raw bytes")]
    pub description: String,
}

/// Algorithms available for a capability
#[derive(Serialize, ToSchema)]
pub struct AlgorithmListResponse {
    pub algorithms: Vec<AlgorithmEntry>,
}

impl From<Vec<AlgorithmDescriptor>> for AlgorithmListResponse {
    fn from(descriptors: Vec<AlgorithmDescriptor>) -> Self {
        Self {
            algorithms: descriptors
                .into_iter()
                .map(|d| AlgorithmEntry {
                    name: d.name,
                    description: d.description,
                })
                .collect(),
        }
    }
}
