//! Explicit load/use/unload lifecycle for compiled artifacts.
//!
//! Loaded code is owned through reference-counted leases instead of relying
//! on garbage-collector-driven unloading: a caller loads an artifact, holds
//! an [`ArtifactLease`] while executing it, and the artifact becomes
//! unloadable once the last lease is dropped. `unload` refuses while any
//! lease is live, so compiled code is released deterministically and never
//! leaks.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use skillforge_types::skill::CacheKey;

/// Errors from the loader lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoaderError {
    #[error("artifact {0} is not loaded")]
    NotLoaded(String),

    #[error("artifact {0} still has {1} live lease(s)")]
    InUse(String, usize),
}

/// A loaded artifact's executable bytes.
#[derive(Debug)]
pub struct LoadedArtifact {
    pub key: CacheKey,
    pub binary: Vec<u8>,
}

/// A lease over a loaded artifact. Holding it keeps the code loaded.
#[derive(Debug, Clone)]
pub struct ArtifactLease {
    inner: Arc<LoadedArtifact>,
}

impl ArtifactLease {
    pub fn artifact(&self) -> &LoadedArtifact {
        &self.inner
    }
}

/// Tracks loaded artifacts and their live leases.
#[derive(Default)]
pub struct ArtifactLoader {
    loaded: DashMap<CacheKey, Arc<LoadedArtifact>>,
}

impl ArtifactLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an artifact (or re-lease it if already loaded) and return a
    /// lease. Loading the same key twice shares the same bytes.
    pub fn load(&self, key: &CacheKey, binary: Vec<u8>) -> ArtifactLease {
        let inner = self
            .loaded
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(LoadedArtifact {
                    key: key.clone(),
                    binary,
                })
            })
            .clone();
        ArtifactLease { inner }
    }

    /// Lease an already-loaded artifact.
    pub fn lease(&self, key: &CacheKey) -> Result<ArtifactLease, LoaderError> {
        self.loaded
            .get(key)
            .map(|entry| ArtifactLease {
                inner: entry.value().clone(),
            })
            .ok_or_else(|| LoaderError::NotLoaded(key.to_string()))
    }

    /// Live lease count for a loaded artifact (excluding the loader's own
    /// reference).
    pub fn lease_count(&self, key: &CacheKey) -> Result<usize, LoaderError> {
        self.loaded
            .get(key)
            .map(|entry| Arc::strong_count(entry.value()) - 1)
            .ok_or_else(|| LoaderError::NotLoaded(key.to_string()))
    }

    /// Unload an artifact. Fails while any lease is live.
    pub fn unload(&self, key: &CacheKey) -> Result<(), LoaderError> {
        // remove_if holds the shard lock, so no new lease can be taken
        // between the count check and the removal.
        let removed = self.loaded.remove_if(key, |_, artifact| {
            Arc::strong_count(artifact) == 1
        });

        match removed {
            Some(_) => Ok(()),
            None => match self.loaded.get(key) {
                Some(entry) => Err(LoaderError::InUse(
                    key.to_string(),
                    Arc::strong_count(entry.value()) - 1,
                )),
                None => Err(LoaderError::NotLoaded(key.to_string())),
            },
        }
    }

    /// Number of artifacts currently loaded.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}
