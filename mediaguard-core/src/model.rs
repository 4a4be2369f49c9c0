//! Data model shared by the registry, the identity store and the orchestrators.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Similarity reported for an exact digest match.
pub const EXACT_MATCH_SIMILARITY: f64 = 100.0;

/// Mapping algorithm name → digest value for one content identity.
pub type Digests = BTreeMap<String, String>;

/// Opaque, globally unique identifier assigned once per distinct piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(Uuid);

impl ContentId {
    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ContentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What an algorithm can do. Hashing and watermarking live in separate registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Hashing,
    Watermarking,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashing => write!(f, "hashing"),
            Self::Watermarking => write!(f, "watermarking"),
        }
    }
}

/// Discovery entry for a registered algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmDescriptor {
    pub name: String,
    pub description: String,
    pub capability: Capability,
}

/// One requested hashing algorithm with its freeform parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSelection {
    pub algorithm: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl AlgorithmSelection {
    /// Select an algorithm by name without parameters
    pub fn named(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            parameters: serde_json::Map::new(),
        }
    }
}

/// Raw media handed to the orchestrators.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    /// Display name recorded when the content is first seen
    pub file_name: String,
    /// Media kind (usually the upload's MIME type)
    pub media_kind: String,
}

impl MediaFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            media_kind: "application/octet-stream".to_string(),
        }
    }

    pub fn with_media_kind(mut self, media_kind: impl Into<String>) -> Self {
        self.media_kind = media_kind.into();
        self
    }
}

/// A match candidate, resolved or not.
///
/// Algorithms produce candidates with `content_id = None`; the query engine
/// fills in the identity and drops the ones it cannot resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub algorithm: String,
    pub content_id: Option<ContentId>,
    pub digest: String,
    /// Similarity score in [0, 100]
    pub similarity: f64,
}

impl SimilarityResult {
    /// A candidate that has not been resolved to an identity yet
    pub fn unresolved(
        algorithm: impl Into<String>,
        digest: impl Into<String>,
        similarity: f64,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            content_id: None,
            digest: digest.into(),
            similarity: normalize_similarity(similarity),
        }
    }

    /// An exact digest match for a known identity
    pub fn exact(
        algorithm: impl Into<String>,
        content_id: ContentId,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            content_id: Some(content_id),
            digest: digest.into(),
            similarity: EXACT_MATCH_SIMILARITY,
        }
    }
}

/// Clamp a score into [0, 100]. Non-finite scores count as no similarity.
pub fn normalize_similarity(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, EXACT_MATCH_SIMILARITY)
    } else {
        0.0
    }
}

/// Persisted facts about an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub file_name: String,
    pub media_kind: String,
    pub primary_digest: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a watermark applied to an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkHistoryEntry {
    pub content_id: ContentId,
    pub algorithm: String,
    /// Primary digest of the watermarked output
    pub post_digest: String,
    pub recorded_at: DateTime<Utc>,
}

/// Result of `ensure_hashes`.
#[derive(Debug, Clone, PartialEq)]
pub struct HashOutcome {
    pub content_id: ContentId,
    pub digests: Digests,
    /// Algorithms whose digest was computed by this call
    pub computed: Vec<String>,
}

/// Result of a successful `embed_and_record`.
#[derive(Debug, Clone)]
pub struct WatermarkOutcome {
    pub content_id: ContentId,
    pub post_digest: String,
    pub artifact: Vec<u8>,
}
