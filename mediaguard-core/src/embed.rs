//! Watermark embedding with history tracking.

use std::sync::Arc;

use tracing::{error, info};

use crate::digest::primary_digest;
use crate::error::{MediaGuardError, Result};
use crate::ingest::identify_or_create;
use crate::model::{MediaFile, WatermarkHistoryEntry, WatermarkOutcome};
use crate::registry::WatermarkingRegistry;
use crate::store::ContentIdentityStore;

#[derive(Clone)]
pub struct WatermarkOrchestrator {
    registry: Arc<WatermarkingRegistry>,
    store: Arc<dyn ContentIdentityStore>,
}

impl WatermarkOrchestrator {
    pub fn new(registry: Arc<WatermarkingRegistry>, store: Arc<dyn ContentIdentityStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &WatermarkingRegistry {
        &self.registry
    }

    /// Embed `payload` into `media` and record the watermarked output in the
    /// history of the content's identity (registering the content if unseen).
    ///
    /// If the artifact was produced but the history entry could not be
    /// written, the call fails with [`MediaGuardError::PartialRecording`],
    /// which still carries the artifact.
    pub async fn embed_and_record(
        &self,
        media: &MediaFile,
        algorithm: &str,
        payload: &[u8],
    ) -> Result<WatermarkOutcome> {
        let watermarker = self.registry.resolve(algorithm)?;

        let primary = primary_digest(&media.bytes);
        let content_id = identify_or_create(self.store.as_ref(), &primary, media).await?;

        let artifact = watermarker
            .embed(&media.bytes, payload)
            .await
            .map_err(MediaGuardError::into_embed)?;
        let post_digest = primary_digest(&artifact);

        if let Err(source) = self
            .store
            .append_watermark_history(content_id, algorithm, &post_digest)
            .await
        {
            error!(
                file_uuid = %content_id,
                algorithm,
                post_digest = %post_digest,
                error = %source,
                "Watermark applied but history not recorded"
            );
            return Err(MediaGuardError::PartialRecording {
                content_id,
                post_digest,
                artifact,
                source,
            });
        }

        info!(file_uuid = %content_id, algorithm, post_digest = %post_digest, "Watermark applied");
        Ok(WatermarkOutcome {
            content_id,
            post_digest,
            artifact,
        })
    }

    /// Read the payload `algorithm` embedded in `content`.
    pub async fn extract(&self, content: &[u8], algorithm: &str) -> Result<Vec<u8>> {
        let watermarker = self.registry.resolve(algorithm)?;
        watermarker
            .extract(content)
            .await
            .map_err(MediaGuardError::into_extraction)
    }

    /// Find the identity a watermarked artifact was produced from.
    pub async fn trace_origin(&self, content: &[u8]) -> Result<WatermarkHistoryEntry> {
        let post_digest = primary_digest(content);
        self.store
            .find_identity_by_watermark_digest(&post_digest)
            .await?
            .ok_or_else(|| {
                MediaGuardError::NotFound("no watermark recorded for this content".into())
            })
    }
}
