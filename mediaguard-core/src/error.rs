use thiserror::Error;

use crate::model::{Capability, ContentId};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum MediaGuardError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown {capability} algorithm '{name}'")]
    UnknownAlgorithm { capability: Capability, name: String },

    #[error("Algorithm '{0}' is already registered")]
    DuplicateAlgorithm(String),

    #[error("Computation failed for '{algorithm}': {message}")]
    Computation { algorithm: String, message: String },

    #[error("Embed error: {0}")]
    Embed(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The watermarked artifact exists but its history entry could not be written.
    /// The artifact is carried so the caller can still hand it out.
    #[error("Watermark embedded for {content_id} but history was not recorded: {source}")]
    PartialRecording {
        content_id: ContentId,
        post_digest: String,
        artifact: Vec<u8>,
        #[source]
        source: StoreError,
    },
}

impl MediaGuardError {
    /// Create a computation error for the named algorithm
    pub fn computation(algorithm: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Computation {
            algorithm: algorithm.into(),
            message: message.into(),
        }
    }

    /// Re-tag a plugin failure as a computation failure of `algorithm`.
    pub(crate) fn into_computation(self, algorithm: &str) -> Self {
        match self {
            e @ Self::Computation { .. } => e,
            other => Self::computation(algorithm, other.to_string()),
        }
    }

    pub(crate) fn into_embed(self) -> Self {
        match self {
            e @ Self::Embed(_) => e,
            other => Self::Embed(other.to_string()),
        }
    }

    pub(crate) fn into_extraction(self) -> Self {
        match self {
            e @ (Self::Extraction(_) | Self::NotFound(_)) => e,
            other => Self::Extraction(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MediaGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_computation_keeps_original_algorithm() {
        let err = MediaGuardError::computation("vt", "service down").into_computation("sha256");
        match err {
            MediaGuardError::Computation { algorithm, .. } => assert_eq!(algorithm, "vt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_extraction_preserves_not_found() {
        let err = MediaGuardError::NotFound("no payload".into()).into_extraction();
        assert!(matches!(err, MediaGuardError::NotFound(_)));

        let err = MediaGuardError::Embed("bad".into()).into_extraction();
        assert!(matches!(err, MediaGuardError::Extraction(_)));
    }
}
