//! HTTP client for the video search engine (VSE).
//!
//! The engine indexes descriptor files and matches query descriptors
//! against everything it has indexed. Both endpoints take the descriptor
//! file as the multipart field `file` and authenticate with a static token
//! in the `Authorization` header.

use std::time::Instant;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::ALGORITHM_VT;
use crate::error::{MediaGuardError, Result};

/// Error code the engine uses when the descriptors are already indexed.
/// The message then carries the existing content id.
pub const ALREADY_INDEXED_CODE: i64 = 208;

#[derive(Debug, Deserialize)]
struct InsertResponse {
    data: InsertData,
}

#[derive(Debug, Deserialize)]
struct InsertData {
    content_id: u64,
    #[serde(default)]
    nr_descs: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error_code: i64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default)]
    matches: Vec<VseMatch>,
}

/// One indexed item matched by a query.
#[derive(Debug, Clone, Deserialize)]
pub struct VseMatch {
    pub content_id: u64,
    /// Percentage of the query covered by the match, as a decimal string
    #[serde(default)]
    pub coverage: String,
    #[serde(default)]
    pub locations: Vec<VseLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VseLocation {
    #[serde(default)]
    pub query_perc: String,
}

impl VseMatch {
    pub fn query_percentages(&self) -> Vec<&str> {
        self.locations.iter().map(|l| l.query_perc.as_str()).collect()
    }
}

pub struct VseClient {
    http: Client,
    base_url: String,
    token: String,
}

impl VseClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| vt_error(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Index `descriptors` and return the engine's content id.
    pub async fn insert(&self, descriptors: Vec<u8>, file_name: &str) -> Result<u64> {
        let form = Form::new().part("file", descriptor_part(descriptors, file_name));
        let (status, body) = self.post("/api/v0/insert", form).await?;
        parse_insert_response(status, &body)
    }

    /// Match `descriptors` against the index.
    pub async fn query(&self, descriptors: Vec<u8>, file_name: &str) -> Result<Vec<VseMatch>> {
        let form = Form::new()
            .part("file", descriptor_part(descriptors, file_name))
            .text("include_metadata", "true");
        let (status, body) = self.post("/api/v0/query", form).await?;
        parse_query_response(status, &body)
    }

    async fn post(&self, path: &str, form: Form) -> Result<(StatusCode, Vec<u8>)> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, url = %url, "Search engine request failed");
                vt_error(format!("request to {url} failed: {e}"))
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| vt_error(format!("failed to read response body: {e}")))?;

        debug!(
            status = %status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Search engine responded"
        );
        Ok((status, body.to_vec()))
    }
}

fn descriptor_part(descriptors: Vec<u8>, file_name: &str) -> Part {
    Part::bytes(descriptors).file_name(file_name.to_string())
}

fn vt_error(message: impl Into<String>) -> MediaGuardError {
    MediaGuardError::computation(ALGORITHM_VT, message)
}

/// Interpret an insert response; "already indexed" counts as success.
pub fn parse_insert_response(status: StatusCode, body: &[u8]) -> Result<u64> {
    if status == StatusCode::OK {
        let parsed: InsertResponse = serde_json::from_slice(body)
            .map_err(|e| vt_error(format!("malformed insert response: {e}")))?;
        debug!(
            content_id = parsed.data.content_id,
            descriptors = parsed.data.nr_descs,
            "Descriptors indexed"
        );
        return Ok(parsed.data.content_id);
    }

    let error: ErrorResponse = serde_json::from_slice(body).unwrap_or_default();
    if error.error_code == ALREADY_INDEXED_CODE {
        let content_id = error.message.trim().parse::<u64>().map_err(|e| {
            vt_error(format!(
                "already-indexed response carried invalid content id '{}': {e}",
                error.message
            ))
        })?;
        debug!(content_id, "Descriptors already indexed");
        return Ok(content_id);
    }

    Err(vt_error(format!(
        "insert returned status {} ({})",
        status, error.message
    )))
}

pub fn parse_query_response(status: StatusCode, body: &[u8]) -> Result<Vec<VseMatch>> {
    if status != StatusCode::OK {
        let error: ErrorResponse = serde_json::from_slice(body).unwrap_or_default();
        return Err(vt_error(format!(
            "query returned status {} ({})",
            status, error.message
        )));
    }

    let parsed: QueryResponse = serde_json::from_slice(body)
        .map_err(|e| vt_error(format!("malformed query response: {e}")))?;
    Ok(parsed.data.matches)
}
