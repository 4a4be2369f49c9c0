//! Exact SHA-256 digest.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::Hasher;
use crate::error::Result;
use crate::model::{SimilarityResult, EXACT_MATCH_SIMILARITY};
use crate::registry::AlgorithmInfo;

pub const ALGORITHM_SHA256: &str = "sha256";

/// SHA-256 over the whole content, hex-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn digest(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }
}

impl AlgorithmInfo for Sha256Hasher {
    fn description(&self) -> &str {
        "SHA-256 is a cryptographic hash function that produces a fixed-size 256-bit (32-byte) hash value"
    }
}

#[async_trait]
impl Hasher for Sha256Hasher {
    async fn extract_digest(&self, content: &[u8]) -> Result<String> {
        Ok(Self::digest(content))
    }

    /// The only possible match of an exact digest is the content itself.
    async fn check_against_corpus(&self, content: &[u8]) -> Result<Vec<SimilarityResult>> {
        Ok(vec![SimilarityResult::unresolved(
            ALGORITHM_SHA256,
            Self::digest(content),
            EXACT_MATCH_SIMILARITY,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_digest_known_vector() {
        let digest = Sha256Hasher.extract_digest(b"abc").await.unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_check_returns_single_exact_candidate() {
        let candidates = Sha256Hasher.check_against_corpus(b"abc").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].algorithm, ALGORITHM_SHA256);
        assert_eq!(candidates[0].similarity, 100.0);
        assert!(candidates[0].content_id.is_none());
        assert_eq!(candidates[0].digest, Sha256Hasher::digest(b"abc"));
    }
}
