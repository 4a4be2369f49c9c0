//! Matching content and digests against recorded identities.
//!
//! Both entry points return only candidates that resolve to a recorded
//! identity. Results are concatenated per algorithm, unranked.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{MediaGuardError, Result};
use crate::model::{normalize_similarity, SimilarityResult};
use crate::registry::HashingRegistry;
use crate::store::ContentIdentityStore;

#[derive(Clone)]
pub struct QueryEngine {
    registry: Arc<HashingRegistry>,
    store: Arc<dyn ContentIdentityStore>,
}

impl QueryEngine {
    pub fn new(registry: Arc<HashingRegistry>, store: Arc<dyn ContentIdentityStore>) -> Self {
        Self { registry, store }
    }

    /// Match `content` with each algorithm in `algorithms` (all registered when empty).
    ///
    /// Unknown algorithm names fail the whole query. Candidates whose digest
    /// is not recorded under the same algorithm are dropped.
    pub async fn query_by_content(
        &self,
        content: &[u8],
        algorithms: &[String],
    ) -> Result<Vec<SimilarityResult>> {
        let names: Vec<String> = if algorithms.is_empty() {
            self.registry.names()
        } else {
            let mut seen = HashSet::new();
            algorithms
                .iter()
                .filter(|name| seen.insert(name.as_str()))
                .cloned()
                .collect()
        };

        let mut hashers = Vec::with_capacity(names.len());
        for name in names {
            let hasher = self.registry.resolve(&name).map_err(|_| {
                let message = format!("unknown hashing algorithm '{}'", name);
                MediaGuardError::InvalidConfiguration(message)
            })?;
            hashers.push((name, hasher));
        }

        let mut results = Vec::new();
        for (name, hasher) in hashers {
            let candidates = hasher
                .check_against_corpus(content)
                .await
                .map_err(|e| e.into_computation(&name))?;

            for candidate in candidates {
                match self
                    .store
                    .find_identity_by_algorithm_digest(&name, &candidate.digest)
                    .await?
                {
                    Some(id) => results.push(SimilarityResult {
                        algorithm: name.clone(),
                        content_id: Some(id),
                        digest: candidate.digest,
                        similarity: normalize_similarity(candidate.similarity),
                    }),
                    None => {
                        debug!(
                            algorithm = %name,
                            digest = %candidate.digest,
                            "Dropping unresolved candidate"
                        );
                    }
                }
            }
        }

        info!(matches = results.len(), "Content query completed");
        Ok(results)
    }

    /// Look up identities by known digests.
    ///
    /// Unknown algorithms and unrecorded digests are skipped. Every match
    /// reports exact similarity.
    pub async fn query_by_digest(
        &self,
        digests: &BTreeMap<String, String>,
    ) -> Result<Vec<SimilarityResult>> {
        let mut results = Vec::new();

        for (algorithm, digest) in digests {
            if !self.registry.contains(algorithm) {
                debug!(algorithm = %algorithm, "Skipping unknown algorithm");
                continue;
            }

            match self
                .store
                .find_identity_by_algorithm_digest(algorithm, digest)
                .await?
            {
                Some(id) => {
                    results.push(SimilarityResult::exact(algorithm.as_str(), id, digest.as_str()))
                }
                None => debug!(algorithm = %algorithm, "No content recorded for digest"),
            }
        }

        info!(matches = results.len(), "Digest query completed");
        Ok(results)
    }
}
