//! Hash query handlers
//!
//! Resolve media or raw digests back to known content identities.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, State},
    Json,
};
use mediaguard_core::SimilarityResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::source::resolve_media;
use crate::state::AppState;

/// `config` field of a query-by-media request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MediaQueryConfig {
    /// Algorithms to query with (empty = all registered)
    #[serde(default)]
    #[schema(example = json!(["sha256", "vt"]))]
    pub algorithms: Vec<String>,
}

/// Body of a query-by-hash request
#[derive(Debug, Deserialize, ToSchema)]
pub struct DigestQueryRequest {
    /// Algorithm name to digest value
    #[schema(example = json!({"sha256": "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"}))]
    pub hashes: BTreeMap<String, String>,
}

/// A match resolved to a known identity
#[derive(Serialize, ToSchema)]
pub struct SimilarityMatch {
    #[schema(example = "sha256")]
    pub algorithm: String,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub file_uuid: String,
    /// Similarity in [0, 100]
    #[schema(example = 100.0)]
    pub similarity: f64,
    /// Matched digest
    pub hash: String,
}

impl SimilarityMatch {
    fn from_result(result: SimilarityResult) -> Option<Self> {
        let content_id = result.content_id?;
        Some(Self {
            algorithm: result.algorithm,
            file_uuid: content_id.to_string(),
            similarity: result.similarity,
            hash: result.digest,
        })
    }
}

fn into_matches(results: Vec<SimilarityResult>) -> Vec<SimilarityMatch> {
    results.into_iter().filter_map(SimilarityMatch::from_result).collect()
}

/// Find known content similar to the submitted media
///
/// Accepts multipart/form-data with:
/// - **media**: the media file (or **playlist_url** to download it)
/// - **config** (optional): `{"algorithms": ["sha256", "vt"]}`
///
/// Nothing is stored. Only matches that resolve to a known identity are returned.
#[utoipa::path(
    post,
    path = "/api/v1/query/hashes/by-media",
    tag = "Query",
    request_body(
        content_type = "multipart/form-data",
        description = "Media file (or playlist_url) with optional algorithm list"
    ),
    responses(
        (status = 200, description = "Resolved matches", body = [SimilarityMatch]),
        (status = 400, description = "Missing media or unknown algorithm"),
        (status = 500, description = "Algorithm or storage failure")
    )
)]
pub async fn query_by_media_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<SimilarityMatch>>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, true, state.max_file_size).await?;
    let config: MediaQueryConfig = fields.get_json("config")?.unwrap_or_default();
    let media = resolve_media(&mut fields, &state.yt_dlp_path, state.max_file_size).await?;

    let results = state.query.query_by_content(&media.bytes, &config.algorithms).await?;
    Ok(Json(into_matches(results)))
}

/// Look up raw digests
///
/// Unknown algorithms and digests with no recorded identity are skipped.
#[utoipa::path(
    post,
    path = "/api/v1/query/hashes/by-hash",
    tag = "Query",
    request_body = DigestQueryRequest,
    responses(
        (status = 200, description = "Exact matches", body = [SimilarityMatch]),
        (status = 400, description = "Malformed request body"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn query_by_hash_handler(
    State(state): State<AppState>,
    Json(request): Json<DigestQueryRequest>,
) -> Result<Json<Vec<SimilarityMatch>>, ApiError> {
    let results = state.query.query_by_digest(&request.hashes).await?;
    Ok(Json(into_matches(results)))
}
