//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use mediaguard_core::{
    ContentIdentityStore, DescriptorHasher, HashOrchestrator, HashingRegistry, MetadataWatermarker,
    QueryEngine, Sha256Hasher, WatermarkOrchestrator, WatermarkingRegistry, ALGORITHM_BASIC,
    ALGORITHM_SHA256, ALGORITHM_VT,
};

use crate::config::Config;
use crate::identity_store::IdentityBackend;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Dedup-aware hash ingestion
    pub ingest: HashOrchestrator,
    /// Content and digest queries
    pub query: QueryEngine,
    /// Watermark embedding, extraction and origin tracing
    pub watermarks: WatermarkOrchestrator,
    /// Identity storage backend (PostgreSQL or memory fallback)
    pub backend: IdentityBackend,
    /// Maximum upload size in bytes
    pub max_file_size: usize,
    /// Executable used to download `playlist_url` sources
    pub yt_dlp_path: Arc<str>,
}

impl AppState {
    /// Wire the orchestrators to one backend and one pair of registries
    pub fn new(
        backend: IdentityBackend,
        hashing: HashingRegistry,
        watermarking: WatermarkingRegistry,
        config: &Config,
    ) -> Self {
        let store = backend.store();
        let hashing = Arc::new(hashing);
        Self {
            ingest: HashOrchestrator::new(hashing.clone(), store.clone()),
            query: QueryEngine::new(hashing, store.clone()),
            watermarks: WatermarkOrchestrator::new(Arc::new(watermarking), store),
            backend,
            max_file_size: config.max_file_size(),
            yt_dlp_path: Arc::from(config.yt_dlp_path.as_str()),
        }
    }

    /// State backed by the built-in algorithms
    pub fn with_builtin_algorithms(
        backend: IdentityBackend,
        config: &Config,
    ) -> mediaguard_core::Result<Self> {
        let (hashing, watermarking) = build_registries(config)?;
        Ok(Self::new(backend, hashing, watermarking, config))
    }

    pub fn store(&self) -> Arc<dyn ContentIdentityStore> {
        self.backend.store()
    }
}

/// Register the built-in hashing and watermarking algorithms
pub fn build_registries(
    config: &Config,
) -> mediaguard_core::Result<(HashingRegistry, WatermarkingRegistry)> {
    let mut hashing = HashingRegistry::hashing();
    hashing.register(ALGORITHM_SHA256, Arc::new(Sha256Hasher))?;
    let descriptor = DescriptorHasher::new(config.descriptor_config())?;
    hashing.register(ALGORITHM_VT, Arc::new(descriptor))?;

    let mut watermarking = WatermarkingRegistry::watermarking();
    watermarking.register(
        ALGORITHM_BASIC,
        Arc::new(MetadataWatermarker::new(config.watermark_config())),
    )?;

    tracing::info!(
        hashing = ?hashing.names(),
        watermarking = ?watermarking.names(),
        "Algorithms registered"
    );

    Ok((hashing, watermarking))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registries() {
        let (hashing, watermarking) = build_registries(&Config::default()).unwrap();
        assert_eq!(hashing.names(), vec!["sha256", "vt"]);
        assert_eq!(watermarking.names(), vec!["basic"]);
    }

    #[test]
    fn test_state_limits_follow_config() {
        let config = Config {
            max_file_size_mb: 3,
            yt_dlp_path: "/usr/local/bin/yt-dlp".into(),
            ..Config::default()
        };
        let state =
            AppState::with_builtin_algorithms(IdentityBackend::in_memory(), &config).unwrap();
        assert_eq!(state.max_file_size, 3 * 1024 * 1024);
        assert_eq!(&*state.yt_dlp_path, "/usr/local/bin/yt-dlp");
        assert_eq!(state.ingest.registry().len(), 2);
    }

    #[test]
    fn test_builtin_hashers_accept_any_media_kind() {
        // Every default hasher runs on an empty selection, so none may be
        // restricted to still images
        let (hashing, _) = build_registries(&Config::default()).unwrap();
        assert!(!hashing.contains("phash"));
        assert!(hashing.names().iter().all(|name| name == "sha256" || name == "vt"));
    }
}
