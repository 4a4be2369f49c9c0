//! Media source resolution
//!
//! A request supplies media either as the uploaded `media` field or as a
//! `playlist_url` that is downloaded with yt-dlp into a scratch directory.

use std::path::Path;
use std::process::Stdio;

use mediaguard_core::MediaFile;
use tokio::process::Command;

use crate::error::ApiError;
use crate::multipart::{FileField, MultipartFields};
use crate::validation::{validate_file_size, validate_source_url};

/// Text field naming a remote source
pub const PLAYLIST_URL_FIELD: &str = "playlist_url";

const DOWNLOAD_FILE_NAME: &str = "playlist.mp4";
const DOWNLOAD_MEDIA_KIND: &str = "video/mp4";

/// Resolve the request's media, preferring an uploaded file over a URL
pub async fn resolve_media(
    fields: &mut MultipartFields,
    yt_dlp_path: &str,
    max_file_size: usize,
) -> Result<MediaFile, ApiError> {
    if let Some(file) = fields.take_file() {
        return Ok(media_from_upload(file));
    }

    match fields.get_text(PLAYLIST_URL_FIELD) {
        Some(url) => {
            let url = validate_source_url(url)?;
            let bytes = download(yt_dlp_path, url.as_str()).await?;
            validate_file_size(bytes.len(), max_file_size)?;
            Ok(MediaFile::new(bytes, DOWNLOAD_FILE_NAME).with_media_kind(DOWNLOAD_MEDIA_KIND))
        }
        None => Err(ApiError::bad_request(
            "No media provided. Use 'media' field or 'playlist_url' in multipart form.",
        )),
    }
}

/// Build a media file from an upload, keeping only the base name of the
/// client-supplied filename
pub fn media_from_upload(file: FileField) -> MediaFile {
    let file_name = file
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();

    let media = MediaFile::new(file.data, file_name);
    match file.content_type {
        Some(content_type) => media.with_media_kind(content_type),
        None => media,
    }
}

async fn download(yt_dlp_path: &str, url: &str) -> Result<Vec<u8>, ApiError> {
    let scratch = tempfile::Builder::new()
        .prefix("mediaguard-playlist-")
        .tempdir()
        .map_err(|e| ApiError::internal(format!("Failed to create scratch directory: {}", e)))?;
    let output_path = scratch.path().join(DOWNLOAD_FILE_NAME);

    tracing::info!(url = %url, "Downloading media from playlist");

    let output = Command::new(yt_dlp_path)
        .arg("--no-continue")
        .arg("--force-overwrites")
        .arg("-o")
        .arg(&output_path)
        .arg("--")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            tracing::error!(program = %yt_dlp_path, error = %e, "Failed to start downloader");
            ApiError::service_unavailable("Playlist downloader is not available")
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            url = %url,
            status = %output.status,
            stderr = %stderr.trim(),
            "Playlist download failed"
        );
        return Err(ApiError::bad_request("Failed to download media from playlist_url"));
    }

    tokio::fs::read(&output_path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read downloaded media: {}", e)))
}
