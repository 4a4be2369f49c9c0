//! Descriptor-based video fingerprinting (`vt`).
//!
//! Visual descriptors are extracted with the external `desc_tools` binary
//! and sent to the video search engine. The engine assigns each indexed
//! item a numeric content id, which is used as this algorithm's digest.
//! Queries return graded matches scored by [`similarity_score`].

pub mod client;
pub mod similarity;

use std::ffi::OsStr;

use async_trait::async_trait;
use tracing::instrument;

use self::client::VseClient;
pub use self::similarity::similarity_score;
use super::Hasher;
use crate::error::{MediaGuardError, Result};
use crate::external::{run_tool, Scratch};
use crate::model::SimilarityResult;
use crate::registry::AlgorithmInfo;

pub const ALGORITHM_VT: &str = "vt";

const DESCRIPTOR_FILE: &str = "input.desc72";

#[derive(Debug, Clone)]
pub struct DescriptorConfig {
    /// Base URL of the video search engine
    pub vse_address: String,
    pub vse_token: String,
    pub desc_tools_path: String,
    /// `desc_tools` extraction preset
    pub preset: String,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            vse_address: "http://vse:7771".to_string(),
            vse_token: "VIDENTIFIER".to_string(),
            desc_tools_path: "./desc_tools".to_string(),
            preset: "optimized".to_string(),
        }
    }
}

pub struct DescriptorHasher {
    config: DescriptorConfig,
    client: VseClient,
}

impl DescriptorHasher {
    pub fn new(config: DescriptorConfig) -> Result<Self> {
        let client = VseClient::new(&config.vse_address, &config.vse_token)?;
        Ok(Self { config, client })
    }

    /// Run `desc_tools` over `content` and return the descriptor file.
    async fn extract_descriptors(&self, content: &[u8]) -> Result<Vec<u8>> {
        let scratch = Scratch::new().map_err(tool_error)?;
        let input = scratch.stage("input", content).await.map_err(tool_error)?;
        let output = scratch.path(DESCRIPTOR_FILE);

        let preset = format!("--preset={}", self.config.preset);
        let args: [&OsStr; 3] = [OsStr::new(&preset), input.as_os_str(), output.as_os_str()];
        run_tool(&self.config.desc_tools_path, args)
            .await
            .map_err(tool_error)?;

        let descriptors = scratch.read(&output).await.map_err(tool_error)?;
        tracing::debug!(bytes = descriptors.len(), "Extracted descriptors");
        Ok(descriptors)
    }
}

impl AlgorithmInfo for DescriptorHasher {
    fn description(&self) -> &str {
        "Descriptor based hashing algorithm for highly accurate content based hashes"
    }
}

#[async_trait]
impl Hasher for DescriptorHasher {
    #[instrument(level = "info", skip_all, fields(algorithm = ALGORITHM_VT, size = content.len()))]
    async fn extract_digest(&self, content: &[u8]) -> Result<String> {
        let descriptors = self.extract_descriptors(content).await?;
        let content_id = self.client.insert(descriptors, DESCRIPTOR_FILE).await?;
        Ok(content_id.to_string())
    }

    #[instrument(level = "info", skip_all, fields(algorithm = ALGORITHM_VT, size = content.len()))]
    async fn check_against_corpus(&self, content: &[u8]) -> Result<Vec<SimilarityResult>> {
        let descriptors = self.extract_descriptors(content).await?;
        let matches = self.client.query(descriptors, DESCRIPTOR_FILE).await?;

        Ok(matches
            .iter()
            .map(|m| {
                let score = similarity_score(&m.query_percentages(), &m.coverage);
                tracing::debug!(content_id = m.content_id, similarity = score, "Descriptor match");
                SimilarityResult::unresolved(ALGORITHM_VT, m.content_id.to_string(), score)
            })
            .collect())
    }
}

fn tool_error(e: crate::external::ToolError) -> MediaGuardError {
    MediaGuardError::computation(ALGORITHM_VT, e.to_string())
}
