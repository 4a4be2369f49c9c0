//! Multipart form parsing helpers
//!
//! Every media endpoint takes the same form shape: a `media` file field plus
//! text fields such as `config`, `data` and `playlist_url`.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Name of the multipart field carrying the media file
pub const MEDIA_FIELD: &str = "media";

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form fields
#[derive(Debug)]
pub struct MultipartFields {
    /// The `media` file field
    file: Option<FileField>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request
    ///
    /// Validates the file's Content-Type when `validate_content_type_flag` is
    /// set, and rejects files larger than `max_file_size` bytes.
    pub async fn parse(
        multipart: &mut Multipart,
        validate_content_type_flag: bool,
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let mut file: Option<FileField> = None;
        let mut text_fields = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == MEDIA_FIELD {
                let content_type = field.content_type().map(|s| s.to_string());
                let file_name = field.file_name().map(|s| s.to_string());

                if validate_content_type_flag {
                    validate_content_type(content_type.as_deref())?;
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read media: {}", e)))?
                    .to_vec();

                validate_file_size(data.len(), max_file_size)?;

                file = Some(FileField {
                    data,
                    content_type,
                    file_name,
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                text_fields.insert(name, value);
            }
        }

        Ok(Self { file, text_fields })
    }

    #[cfg(test)]
    pub(crate) fn from_text<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            file: None,
            text_fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Get the media field (required)
    pub fn require_file(&self) -> Result<&FileField, ApiError> {
        self.file.as_ref().ok_or_else(|| {
            ApiError::bad_request("No media provided. Use 'media' field in multipart form.")
        })
    }

    /// Get the media field (optional)
    pub fn get_file(&self) -> Option<&FileField> {
        self.file.as_ref()
    }

    /// Take ownership of the media field
    pub fn take_file(&mut self) -> Option<FileField> {
        self.file.take()
    }

    /// Get a text field value, treating blank values as absent
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields
            .get(name)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Get a text field parsed as JSON
    ///
    /// Returns:
    /// - `Ok(Some(T))` if the field exists and is valid JSON
    /// - `Ok(None)` if the field is missing or empty
    /// - `Err(ApiError)` if the field exists but JSON parsing fails
    pub fn get_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        match self.get_text(name) {
            Some(json) => {
                let value: T = serde_json::from_str(json)
                    .map_err(|e| ApiError::bad_request(format!("Invalid {} JSON: {}", name, e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
