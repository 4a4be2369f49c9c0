//! Algorithm registries.
//!
//! A registry maps algorithm names to implementations of one capability.
//! Registries are built at startup by the composition root and then shared
//! read-only (behind `Arc`) with the orchestrators:
//!
//! ```
//! use std::sync::Arc;
//! use mediaguard_core::hashing::sha256::{Sha256Hasher, ALGORITHM_SHA256};
//! use mediaguard_core::HashingRegistry;
//!
//! let mut registry = HashingRegistry::hashing();
//! registry.register(ALGORITHM_SHA256, Arc::new(Sha256Hasher)).unwrap();
//! assert!(registry.resolve(ALGORITHM_SHA256).is_ok());
//! assert!(registry.register(ALGORITHM_SHA256, Arc::new(Sha256Hasher)).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{MediaGuardError, Result};
use crate::hashing::Hasher;
use crate::model::{AlgorithmDescriptor, Capability};
use crate::watermarking::Watermarker;

/// Metadata every registered algorithm exposes for discovery.
pub trait AlgorithmInfo: Send + Sync {
    /// Human-readable description
    fn description(&self) -> &str;
}

/// Name → implementation catalog for a single capability.
pub struct AlgorithmRegistry<A: ?Sized> {
    capability: Capability,
    entries: HashMap<String, Arc<A>>,
}

pub type HashingRegistry = AlgorithmRegistry<dyn Hasher>;
pub type WatermarkingRegistry = AlgorithmRegistry<dyn Watermarker>;

impl HashingRegistry {
    /// Create an empty registry for hashing algorithms
    pub fn hashing() -> Self {
        Self::new(Capability::Hashing)
    }
}

impl WatermarkingRegistry {
    /// Create an empty registry for watermarking algorithms
    pub fn watermarking() -> Self {
        Self::new(Capability::Watermarking)
    }
}

impl<A: ?Sized + AlgorithmInfo> AlgorithmRegistry<A> {
    fn new(capability: Capability) -> Self {
        Self {
            capability,
            entries: HashMap::new(),
        }
    }

    /// Register `algorithm` under `name`.
    ///
    /// Names are unique per registry; registering a name twice is rejected
    /// and leaves the first registration in place.
    pub fn register(&mut self, name: impl Into<String>, algorithm: Arc<A>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MediaGuardError::InvalidConfiguration(
                "algorithm name must not be empty".into(),
            ));
        }
        if self.entries.contains_key(&name) {
            return Err(MediaGuardError::DuplicateAlgorithm(name));
        }

        tracing::debug!(capability = %self.capability, algorithm = %name, "Registered algorithm");
        self.entries.insert(name, algorithm);
        Ok(())
    }

    /// Look up an algorithm by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<A>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| MediaGuardError::UnknownAlgorithm {
                capability: self.capability,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Descriptors of every registered algorithm, sorted by name.
    pub fn list(&self) -> Vec<AlgorithmDescriptor> {
        let mut descriptors: Vec<AlgorithmDescriptor> = self
            .entries
            .iter()
            .map(|(name, algorithm)| AlgorithmDescriptor {
                name: name.clone(),
                description: algorithm.description().to_string(),
                capability: self.capability,
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: ?Sized> fmt::Debug for AlgorithmRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("AlgorithmRegistry")
            .field("capability", &self.capability)
            .field("algorithms", &names)
            .finish()
    }
}
