//! Hash ingestion.
//!
//! [`HashOrchestrator::ensure_hashes`] guarantees that every requested
//! algorithm has a digest recorded for the content's identity, computing
//! only what is missing:
//!
//! 1. resolve every requested algorithm (unknown names fail before any work)
//! 2. compute the primary digest and look up the identity
//! 3. return straight away if all requested digests are already recorded
//! 4. otherwise create the identity if needed, compute the missing digests
//!    and record each one with insert-if-absent
//! 5. re-read and return the full digest mapping

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::digest::primary_digest;
use crate::error::{MediaGuardError, Result};
use crate::hashing::Hasher;
use crate::model::{AlgorithmSelection, ContentId, HashOutcome, MediaFile};
use crate::registry::HashingRegistry;
use crate::store::ContentIdentityStore;

#[derive(Clone)]
pub struct HashOrchestrator {
    registry: Arc<HashingRegistry>,
    store: Arc<dyn ContentIdentityStore>,
}

impl HashOrchestrator {
    pub fn new(registry: Arc<HashingRegistry>, store: Arc<dyn ContentIdentityStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &HashingRegistry {
        &self.registry
    }

    /// Make sure `media` has a digest for every selected algorithm.
    ///
    /// An empty selection means every registered hashing algorithm. If a
    /// plugin fails, digests recorded earlier in the same call are kept.
    pub async fn ensure_hashes(
        &self,
        media: &MediaFile,
        selections: &[AlgorithmSelection],
    ) -> Result<HashOutcome> {
        let requested = self.resolve_selection(selections)?;
        let primary = primary_digest(&media.bytes);

        let known = self.store.find_identity_by_primary_digest(&primary).await?;
        let (content_id, existing) = match known {
            Some(id) => {
                let digests = self.store.list_digests(id).await?;
                if requested.iter().all(|(name, _)| digests.contains_key(name)) {
                    debug!(file_uuid = %id, "All requested digests already recorded");
                    return Ok(HashOutcome {
                        content_id: id,
                        digests,
                        computed: Vec::new(),
                    });
                }
                (id, digests)
            }
            None => {
                let id = identify_or_create(self.store.as_ref(), &primary, media).await?;
                // A concurrent caller may have created it first and recorded digests.
                let digests = self.store.list_digests(id).await?;
                (id, digests)
            }
        };

        let mut computed = Vec::new();
        for (name, hasher) in &requested {
            if existing.contains_key(name) {
                continue;
            }

            if let Some(selection) = selections.iter().find(|s| &s.algorithm == name) {
                if !selection.parameters.is_empty() {
                    debug!(
                        algorithm = %name,
                        parameters = ?selection.parameters,
                        "Algorithm parameters supplied"
                    );
                }
            }

            let digest = hasher
                .extract_digest(&media.bytes)
                .await
                .map_err(|e| e.into_computation(name))?;
            self.store
                .insert_digest_if_absent(content_id, name, &digest)
                .await?;
            computed.push(name.clone());
        }

        let digests = self.store.list_digests(content_id).await?;
        info!(
            file_uuid = %content_id,
            computed = ?computed,
            total = digests.len(),
            "Hashes ensured"
        );

        Ok(HashOutcome {
            content_id,
            digests,
            computed,
        })
    }

    /// Resolve the selection into unique (name, hasher) pairs, in request order.
    fn resolve_selection(
        &self,
        selections: &[AlgorithmSelection],
    ) -> Result<Vec<(String, Arc<dyn Hasher>)>> {
        let names: Vec<String> = if selections.is_empty() {
            self.registry.names()
        } else {
            selections.iter().map(|s| s.algorithm.clone()).collect()
        };

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.clone()) {
                continue;
            }
            let hasher = self.registry.resolve(&name).map_err(|_| {
                let message = format!("unknown hashing algorithm '{}'", name);
                MediaGuardError::InvalidConfiguration(message)
            })?;
            resolved.push((name, hasher));
        }

        if resolved.is_empty() {
            return Err(MediaGuardError::InvalidConfiguration(
                "no hashing algorithms are registered".into(),
            ));
        }
        Ok(resolved)
    }
}

/// Look up the identity for `primary`, creating it from `media` if unseen.
pub(crate) async fn identify_or_create(
    store: &dyn ContentIdentityStore,
    primary: &str,
    media: &MediaFile,
) -> Result<ContentId> {
    if let Some(id) = store.find_identity_by_primary_digest(primary).await? {
        return Ok(id);
    }

    let id = store
        .create_identity(primary, &media.file_name, &media.media_kind)
        .await?;
    info!(file_uuid = %id, filename = %media.file_name, "Registered new content");
    Ok(id)
}
