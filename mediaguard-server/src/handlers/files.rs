//! Content record handler
//!
//! Handles GET /api/v1/files/{uuid}.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use mediaguard_core::{ContentId, MediaGuardError, WatermarkHistoryEntry};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

/// A watermark applied to the content
#[derive(Serialize, ToSchema)]
pub struct WatermarkHistoryItem {
    #[schema(example = "basic")]
    pub algorithm: String,
    /// SHA3-256 of the watermarked output
    pub digest: String,
    /// RFC 3339 timestamp
    pub recorded_at: String,
}

impl From<WatermarkHistoryEntry> for WatermarkHistoryItem {
    fn from(entry: WatermarkHistoryEntry) -> Self {
        Self {
            algorithm: entry.algorithm,
            digest: entry.post_digest,
            recorded_at: entry.recorded_at.to_rfc3339(),
        }
    }
}

/// Everything known about one content identity
#[derive(Serialize, ToSchema)]
pub struct FileResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub file_uuid: String,
    #[schema(example = "clip.mp4")]
    pub filename: String,
    #[schema(example = "video/mp4")]
    pub media_type: String,
    /// SHA3-256 of the content as first registered
    pub primary_digest: String,
    pub created_at: String,
    pub hashes: BTreeMap<String, String>,
    /// Oldest first
    pub watermarks: Vec<WatermarkHistoryItem>,
}

/// Get a content record with its digests and watermark history
#[utoipa::path(
    get,
    path = "/api/v1/files/{uuid}",
    tag = "Files",
    params(
        ("uuid" = String, Path, description = "Content identity")
    ),
    responses(
        (status = 200, description = "Content record", body = FileResponse),
        (status = 400, description = "Invalid UUID"),
        (status = 404, description = "Unknown content identity")
    )
)]
pub async fn get_file_handler(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let id: ContentId = uuid
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid file UUID format"))?;

    let store = state.store();
    let record = store
        .get_content(id)
        .await
        .map_err(MediaGuardError::from)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;
    let hashes = store.list_digests(id).await.map_err(MediaGuardError::from)?;
    let history = store.list_watermark_history(id).await.map_err(MediaGuardError::from)?;

    Ok(Json(FileResponse {
        file_uuid: record.id.to_string(),
        filename: record.file_name,
        media_type: record.media_kind,
        primary_digest: record.primary_digest,
        created_at: record.created_at.to_rfc3339(),
        hashes,
        watermarks: history.into_iter().map(Into::into).collect(),
    }))
}
