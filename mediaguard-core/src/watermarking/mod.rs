//! Watermarking algorithms.
//!
//! A [`Watermarker`] writes an opaque payload into content and reads it
//! back. Extraction distinguishes "nothing embedded"
//! ([`MediaGuardError::NotFound`](crate::MediaGuardError::NotFound)) from
//! unreadable input
//! ([`MediaGuardError::Extraction`](crate::MediaGuardError::Extraction)).

#[cfg(feature = "media-tools")]
pub mod metadata;

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::AlgorithmInfo;

/// Watermarking capability of an algorithm plugin.
#[async_trait]
pub trait Watermarker: AlgorithmInfo {
    /// Produce a copy of `content` carrying `payload`.
    async fn embed(&self, content: &[u8], payload: &[u8]) -> Result<Vec<u8>>;

    /// Read back the payload embedded in `content`.
    async fn extract(&self, content: &[u8]) -> Result<Vec<u8>>;
}
