//! Hashing algorithms.
//!
//! A [`Hasher`] produces a digest for a piece of content and can check
//! content against whatever corpus the algorithm knows about. The registry
//! is blind to how either is done:
//!
//! - `sha256` - exact cryptographic digest, every match scores 100
//! - `vt` - descriptor fingerprints matched by the video search engine (feature `network`)

#[cfg(feature = "network")]
pub mod descriptor;
pub mod sha256;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::SimilarityResult;
use crate::registry::AlgorithmInfo;

/// Hashing capability of an algorithm plugin.
#[async_trait]
pub trait Hasher: AlgorithmInfo {
    /// Compute this algorithm's digest for `content`.
    ///
    /// Failures are reported as
    /// [`MediaGuardError::Computation`](crate::MediaGuardError::Computation).
    async fn extract_digest(&self, content: &[u8]) -> Result<String>;

    /// Produce match candidates for `content`.
    ///
    /// Candidates carry the digest under which a match would be stored and a
    /// similarity score; they are not resolved to content identities here.
    async fn check_against_corpus(&self, content: &[u8]) -> Result<Vec<SimilarityResult>>;
}
