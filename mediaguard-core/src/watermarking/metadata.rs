//! Container metadata watermark.
//!
//! Stores the payload as a text tag of the media container. Embedding
//! remuxes with `ffmpeg -codec copy` (no re-encode); extraction reads the
//! container tags with `ffprobe`. The mark survives copying but not
//! transcoding or tag stripping.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use tracing::instrument;

use super::Watermarker;
use crate::error::{MediaGuardError, Result};
use crate::external::{run_tool, Scratch, ToolError};
use crate::registry::AlgorithmInfo;

pub const ALGORITHM_BASIC: &str = "basic";

/// Tool locations and tag layout for [`MetadataWatermarker`].
#[derive(Debug, Clone)]
pub struct MetadataWatermarkConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Container tag that carries the payload
    pub tag: String,
    /// Extension (and therefore muxer) of the watermarked output
    pub output_extension: String,
}

impl Default for MetadataWatermarkConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            tag: "comment".to_string(),
            output_extension: "mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetadataWatermarker {
    config: MetadataWatermarkConfig,
}

impl MetadataWatermarker {
    pub fn new(config: MetadataWatermarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetadataWatermarkConfig {
        &self.config
    }
}

impl AlgorithmInfo for MetadataWatermarker {
    fn description(&self) -> &str {
        "Basic watermark that writes the payload into the container comment metadata"
    }
}

#[async_trait]
impl Watermarker for MetadataWatermarker {
    #[instrument(
        level = "debug",
        skip_all,
        fields(algorithm = ALGORITHM_BASIC, size = content.len())
    )]
    async fn embed(&self, content: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        let payload = std::str::from_utf8(payload)
            .map_err(|_| MediaGuardError::Embed("payload must be valid UTF-8 text".into()))?;
        if payload.contains('\0') {
            return Err(MediaGuardError::Embed("payload must not contain NUL bytes".into()));
        }

        let scratch = Scratch::new().map_err(embed_error)?;
        let input = scratch.stage("input", content).await.map_err(embed_error)?;
        let output = scratch.path(&format!("output.{}", self.config.output_extension));

        let metadata = format!("{}={}", self.config.tag, payload);
        let args: [&OsStr; 8] = [
            OsStr::new("-y"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-metadata"),
            OsStr::new(&metadata),
            OsStr::new("-codec"),
            OsStr::new("copy"),
            output.as_os_str(),
        ];
        run_tool(&self.config.ffmpeg_path, args)
            .await
            .map_err(embed_error)?;

        scratch.read(&output).await.map_err(embed_error)
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(algorithm = ALGORITHM_BASIC, size = content.len())
    )]
    async fn extract(&self, content: &[u8]) -> Result<Vec<u8>> {
        let scratch = Scratch::new().map_err(extraction_error)?;
        let input = scratch.stage("input", content).await.map_err(extraction_error)?;

        let args: [&OsStr; 6] = [
            OsStr::new("-v"),
            OsStr::new("quiet"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_format"),
            input.as_os_str(),
        ];
        let stdout = run_tool(&self.config.ffprobe_path, args)
            .await
            .map_err(extraction_error)?;

        let value = parse_probe_tag(&stdout, &self.config.tag)?;
        Ok(value.into_bytes())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Pull `tag` out of `ffprobe -print_format json -show_format` output.
///
/// Tag names are matched case-insensitively; some muxers upper-case them.
pub fn parse_probe_tag(probe_json: &[u8], tag: &str) -> Result<String> {
    let probe: ProbeOutput = serde_json::from_slice(probe_json)
        .map_err(|e| MediaGuardError::Extraction(format!("unreadable probe output: {}", e)))?;

    let format = probe
        .format
        .ok_or_else(|| MediaGuardError::Extraction("probe output has no format section".into()))?;

    format
        .tags
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(tag))
        .map(|(_, value)| value)
        .ok_or_else(|| MediaGuardError::NotFound(format!("no '{}' tag in media", tag)))
}

fn embed_error(e: ToolError) -> MediaGuardError {
    MediaGuardError::Embed(e.to_string())
}

fn extraction_error(e: ToolError) -> MediaGuardError {
    MediaGuardError::Extraction(e.to_string())
}
