//! Primary content digest.
//!
//! The primary digest is an exact whole-file SHA3-256 digest computed
//! outside the plugin system. It is the dedup key for content identities
//! and the digest recorded for watermarked artifacts.

use sha3::{Digest, Sha3_256};

/// Name of the primary digest function.
pub const PRIMARY_DIGEST_ALGORITHM: &str = "sha3-256";

/// Compute the hex-encoded primary digest of `content`.
pub fn primary_digest(content: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
