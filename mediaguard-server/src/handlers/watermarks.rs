//! Watermark handlers
//!
//! Embedding returns the watermarked media itself; extraction and origin
//! tracing return JSON.

use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use mediaguard_core::{ContentId, MediaGuardError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AlgorithmListResponse;
use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::source::resolve_media;
use crate::state::AppState;

/// Identity the watermarked media was registered under
pub const FILE_UUID_HEADER: &str = "x-mediaguard-file-uuid";
/// SHA3-256 of the returned media
pub const POST_DIGEST_HEADER: &str = "x-mediaguard-post-digest";
/// "recorded", or "failed" when the history entry could not be written
pub const RECORDING_HEADER: &str = "x-mediaguard-recording";

/// `config` field of watermark requests
#[derive(Debug, Deserialize, ToSchema)]
pub struct WatermarkConfig {
    #[schema(example = "basic")]
    pub algorithm: String,
}

/// Payload read back from watermarked media
#[derive(Serialize, ToSchema)]
pub struct WatermarkResponse {
    #[schema(example = "basic")]
    pub algorithm: String,
    #[schema(example = json!({"owner": "newsroom", "license": "cc-by"}))]
    pub watermark: BTreeMap<String, String>,
}

/// Identity a watermarked artifact was produced from
#[derive(Serialize, ToSchema)]
pub struct OriginResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub file_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[schema(example = "basic")]
    pub algorithm: String,
    pub digest: String,
    pub recorded_at: String,
}

fn require_config(fields: &MultipartFields) -> Result<WatermarkConfig, ApiError> {
    fields
        .get_json("config")?
        .ok_or_else(|| ApiError::bad_request("Missing watermark algorithm config"))
}

/// The `data` field must be a JSON object of strings; it is embedded as sent.
fn require_payload(fields: &MultipartFields) -> Result<Vec<u8>, ApiError> {
    let data = fields
        .get_text("data")
        .ok_or_else(|| ApiError::bad_request("Missing watermark data"))?;
    serde_json::from_str::<BTreeMap<String, String>>(data)
        .map_err(|e| ApiError::bad_request(format!("Invalid data JSON: {}", e)))?;
    Ok(data.trim().as_bytes().to_vec())
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::internal(format!("Invalid header value: {}", e)))
}

fn attachment_response(
    artifact: Vec<u8>,
    file_name: &str,
    media_kind: &str,
    content_id: ContentId,
    post_digest: &str,
    recording: &'static str,
) -> Result<Response, ApiError> {
    let file_name: String = file_name
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    let disposition = format!("attachment; filename=\"watermarked_{}\"", file_name);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, header_value(media_kind)?)
        .header(header::CONTENT_DISPOSITION, header_value(&disposition)?)
        .header(FILE_UUID_HEADER, header_value(&content_id.to_string())?)
        .header(POST_DIGEST_HEADER, header_value(post_digest)?)
        .header(RECORDING_HEADER, HeaderValue::from_static(recording))
        .body(Body::from(artifact))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// Embed a watermark and record it
///
/// Accepts multipart/form-data with:
/// - **media**: the media file (or **playlist_url** to download it)
/// - **config**: `{"algorithm": "basic"}`
/// - **data**: JSON object of strings to embed
///
/// Returns the watermarked media as an attachment. If the watermark was
/// applied but its history entry could not be stored, the media is still
/// returned with `x-mediaguard-recording: failed`.
#[utoipa::path(
    post,
    path = "/api/v1/watermarks",
    tag = "Watermarking",
    request_body(
        content_type = "multipart/form-data",
        description = "Media file with watermark config and data"
    ),
    responses(
        (
            status = 200,
            description = "Watermarked media",
            content_type = "application/octet-stream"
        ),
        (status = 400, description = "Missing media, config or data, or unknown algorithm"),
        (status = 500, description = "Embedding failed")
    )
)]
pub async fn embed_watermark_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, true, state.max_file_size).await?;
    let config = require_config(&fields)?;
    let payload = require_payload(&fields)?;
    let media = resolve_media(&mut fields, &state.yt_dlp_path, state.max_file_size).await?;

    match state
        .watermarks
        .embed_and_record(&media, &config.algorithm, &payload)
        .await
    {
        Ok(outcome) => attachment_response(
            outcome.artifact,
            &media.file_name,
            &media.media_kind,
            outcome.content_id,
            &outcome.post_digest,
            "recorded",
        ),
        Err(MediaGuardError::PartialRecording {
            content_id,
            post_digest,
            artifact,
            source,
        }) => {
            tracing::warn!(
                file_uuid = %content_id,
                algorithm = %config.algorithm,
                error = %source,
                "Returning watermarked media without a history entry"
            );
            attachment_response(
                artifact,
                &media.file_name,
                &media.media_kind,
                content_id,
                &post_digest,
                "failed",
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Read a watermark
///
/// Accepts multipart/form-data with **media** and **config** `{"algorithm": "basic"}`.
#[utoipa::path(
    post,
    path = "/api/v1/query/watermarks",
    tag = "Watermarking",
    request_body(
        content_type = "multipart/form-data",
        description = "Media file with watermark config"
    ),
    responses(
        (status = 200, description = "Embedded payload", body = WatermarkResponse),
        (status = 400, description = "Missing media or config, or unknown algorithm"),
        (status = 404, description = "Media carries no watermark"),
        (status = 422, description = "Watermark could not be read")
    )
)]
pub async fn extract_watermark_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<WatermarkResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, true, state.max_file_size).await?;
    let config = require_config(&fields)?;
    let media = resolve_media(&mut fields, &state.yt_dlp_path, state.max_file_size).await?;

    let payload = state.watermarks.extract(&media.bytes, &config.algorithm).await?;
    let watermark: BTreeMap<String, String> = serde_json::from_slice(&payload).map_err(|e| {
        MediaGuardError::Extraction(format!("payload is not a JSON object of strings: {}", e))
    })?;

    Ok(Json(WatermarkResponse {
        algorithm: config.algorithm,
        watermark,
    }))
}

/// Trace watermarked media back to its original content
///
/// Accepts multipart/form-data with **media**.
#[utoipa::path(
    post,
    path = "/api/v1/query/watermarks/origin",
    tag = "Watermarking",
    request_body(
        content_type = "multipart/form-data",
        description = "Watermarked media file"
    ),
    responses(
        (status = 200, description = "Original content identity", body = OriginResponse),
        (status = 404, description = "No watermark recorded for this media")
    )
)]
pub async fn trace_origin_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OriginResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, true, state.max_file_size).await?;
    let media = resolve_media(&mut fields, &state.yt_dlp_path, state.max_file_size).await?;

    let entry = state.watermarks.trace_origin(&media.bytes).await?;
    let filename = state
        .store()
        .get_content(entry.content_id)
        .await
        .map_err(MediaGuardError::from)?
        .map(|record| record.file_name);

    Ok(Json(OriginResponse {
        file_uuid: entry.content_id.to_string(),
        filename,
        algorithm: entry.algorithm,
        digest: entry.post_digest,
        recorded_at: entry.recorded_at.to_rfc3339(),
    }))
}

/// List watermarking algorithms
#[utoipa::path(
    get,
    path = "/api/v1/watermarks/algorithms",
    tag = "Watermarking",
    responses(
        (
            status = 200,
            description = "Registered watermarking algorithms",
            body = AlgorithmListResponse
        )
    )
)]
pub async fn list_watermark_algorithms_handler(
    State(state): State<AppState>,
) -> Json<AlgorithmListResponse> {
    Json(state.watermarks.registry().list().into())
}
