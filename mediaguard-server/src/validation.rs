//! Upload validation module
//!
//! Provides validation utilities for multipart uploads and source URLs.

use url::Url;

use crate::error::ApiError;

/// Allowed MIME type categories for media uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "video/", "audio/", "application/octet-stream"];

/// Default max file size in bytes (500 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 500 * 1024 * 1024;

/// Validates the Content-Type of an uploaded file
///
/// Accepts image/*, video/*, audio/* and application/octet-stream.
/// A missing Content-Type is treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, video/*, audio/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}

/// Validates a remote media source URL
///
/// Only http(s) URLs with a host are accepted; anything else would let a
/// request make the downloader read local files or pass it options.
/// Returns the normalized URL that should be handed to the downloader.
pub fn validate_source_url(url: &str) -> Result<Url, ApiError> {
    let invalid = || {
        ApiError::bad_request(format!(
            "Invalid playlist_url: '{}'. Only http(s) URLs are supported",
            url
        ))
    };

    let trimmed = url.trim();
    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());

    if matches!(parsed.scheme(), "http" | "https") && has_host {
        Ok(parsed)
    } else {
        Err(invalid())
    }
}
