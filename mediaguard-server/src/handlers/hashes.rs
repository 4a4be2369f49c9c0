//! Hash ingestion handlers
//!
//! Handles POST /api/v1/hashes and the hashing algorithm listing.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, State},
    Json,
};
use mediaguard_core::AlgorithmSelection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AlgorithmListResponse;
use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::source::resolve_media;
use crate::state::AppState;

/// One requested hashing algorithm
#[derive(Debug, Deserialize, ToSchema)]
pub struct HashAlgorithmConfig {
    #[schema(example = "sha256")]
    pub algorithm: String,
    /// Freeform algorithm parameters
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl From<HashAlgorithmConfig> for AlgorithmSelection {
    fn from(config: HashAlgorithmConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            parameters: config.parameters,
        }
    }
}

/// `config` field of a hash ingestion request
///
/// An empty list selects every registered algorithm.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct HashConfig {
    #[serde(default, rename = "hashAlgorithms", alias = "hash_algorithms")]
    pub hash_algorithms: Vec<HashAlgorithmConfig>,
}

/// Stored digests of one content identity
#[derive(Serialize, ToSchema)]
pub struct HashResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub file_uuid: String,
    #[schema(example = "clip.mp4")]
    pub filename: String,
    /// Algorithm name to digest, for every digest stored for this identity
    pub hashes: BTreeMap<String, String>,
    /// Algorithms computed by this request (empty when everything was already known)
    pub computed: Vec<String>,
}

/// Register media and compute its digests
///
/// Accepts multipart/form-data with:
/// - **media**: the media file (or **playlist_url** to download it)
/// - **config** (optional): `{"hashAlgorithms": [{"algorithm": "sha256", "parameters": {}}]}`
///
/// Known content keeps its identity and only missing digests are computed.
#[utoipa::path(
    post,
    path = "/api/v1/hashes",
    tag = "Hashing",
    request_body(
        content_type = "multipart/form-data",
        description = "Media file (or playlist_url) with optional hash config"
    ),
    responses(
        (status = 200, description = "Digests stored", body = HashResponse),
        (status = 400, description = "Missing media, invalid config or unknown algorithm"),
        (status = 500, description = "Algorithm or storage failure")
    )
)]
pub async fn create_hashes_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<HashResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, true, state.max_file_size).await?;
    let config: HashConfig = fields.get_json("config")?.unwrap_or_default();
    let media = resolve_media(&mut fields, &state.yt_dlp_path, state.max_file_size).await?;

    let selections: Vec<AlgorithmSelection> =
        config.hash_algorithms.into_iter().map(Into::into).collect();
    let outcome = state.ingest.ensure_hashes(&media, &selections).await?;

    Ok(Json(HashResponse {
        file_uuid: outcome.content_id.to_string(),
        filename: media.file_name,
        hashes: outcome.digests,
        computed: outcome.computed,
    }))
}

/// List hashing algorithms
#[utoipa::path(
    get,
    path = "/api/v1/hashes/algorithms",
    tag = "Hashing",
    responses(
        (status = 200, description = "Registered hashing algorithms", body = AlgorithmListResponse)
    )
)]
pub async fn list_hash_algorithms_handler(
    State(state): State<AppState>,
) -> Json<AlgorithmListResponse> {
    Json(state.ingest.registry().list().into())
}
