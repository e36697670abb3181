//! In-memory cache backend.
//!
//! A dashmap-backed implementation of the cache ports for tests and
//! single-process deployments. Pair atomicity is trivial here: an upload
//! inserts the finished record in one map insert, so a reader can never
//! observe a binary without its symbols.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use skillforge_types::error::CacheError;
use skillforge_types::org::OrganizationIdentifier;
use skillforge_types::skill::CacheKey;

use super::store::{ArtifactClient, AssemblyCache, CacheDirectory};

type ArtifactMap = Arc<DashMap<CacheKey, StoredArtifact>>;

#[derive(Clone)]
struct StoredArtifact {
    binary: Vec<u8>,
    symbols: Vec<u8>,
    last_accessed: Option<DateTime<Utc>>,
}

/// In-memory [`AssemblyCache`] implementation.
#[derive(Default)]
pub struct InMemoryAssemblyCache {
    directories: DashMap<OrganizationIdentifier, ArtifactMap>,
}

impl InMemoryAssemblyCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssemblyCache for InMemoryAssemblyCache {
    type Dir = MemoryDirectory;

    async fn get_or_create_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<MemoryDirectory, CacheError> {
        let artifacts = self
            .directories
            .entry(org.clone())
            .or_insert_with(|| Arc::new(DashMap::new()))
            .clone();
        Ok(MemoryDirectory { artifacts })
    }

    async fn get_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<Option<MemoryDirectory>, CacheError> {
        Ok(self
            .directories
            .get(org)
            .map(|entry| MemoryDirectory {
                artifacts: entry.value().clone(),
            }))
    }
}

/// One organization's in-memory artifact namespace.
pub struct MemoryDirectory {
    artifacts: ArtifactMap,
}

impl CacheDirectory for MemoryDirectory {
    type Client = MemoryArtifactClient;

    fn artifact(&self, key: &CacheKey) -> MemoryArtifactClient {
        MemoryArtifactClient {
            key: key.clone(),
            artifacts: self.artifacts.clone(),
        }
    }

    fn list_artifacts(&self) -> impl Stream<Item = Result<MemoryArtifactClient, CacheError>> + Send {
        // Snapshot the keys so the stream is finite even while writers race.
        let keys: Vec<CacheKey> = self.artifacts.iter().map(|e| e.key().clone()).collect();
        let artifacts = self.artifacts.clone();
        futures_util::stream::iter(keys.into_iter().map(move |key| {
            Ok(MemoryArtifactClient {
                key,
                artifacts: artifacts.clone(),
            })
        }))
    }
}

/// Client addressing one artifact in the in-memory backend.
pub struct MemoryArtifactClient {
    key: CacheKey,
    artifacts: ArtifactMap,
}

impl ArtifactClient for MemoryArtifactClient {
    fn cache_key(&self) -> &CacheKey {
        &self.key
    }

    async fn exists(&self) -> Result<bool, CacheError> {
        Ok(self.artifacts.contains_key(&self.key))
    }

    async fn symbols_exist(&self) -> Result<bool, CacheError> {
        Ok(self.artifacts.contains_key(&self.key))
    }

    async fn download_binary(&self) -> Result<Vec<u8>, CacheError> {
        self.artifacts
            .get(&self.key)
            .map(|entry| entry.binary.clone())
            .ok_or_else(|| CacheError::NotFound(self.key.to_string()))
    }

    async fn download_symbols(&self) -> Result<Vec<u8>, CacheError> {
        self.artifacts
            .get(&self.key)
            .map(|entry| entry.symbols.clone())
            .ok_or_else(|| CacheError::NotFound(self.key.to_string()))
    }

    async fn upload(
        &self,
        binary: &[u8],
        symbols: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(), CacheError> {
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        self.artifacts.insert(
            self.key.clone(),
            StoredArtifact {
                binary: binary.to_vec(),
                symbols: symbols.to_vec(),
                last_accessed: None,
            },
        );
        Ok(())
    }

    async fn delete_if_exists(&self) -> Result<(), CacheError> {
        self.artifacts.remove(&self.key);
        Ok(())
    }

    async fn last_accessed(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        Ok(self
            .artifacts
            .get(&self.key)
            .and_then(|entry| entry.last_accessed))
    }

    async fn set_last_accessed(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        if let Some(mut entry) = self.artifacts.get_mut(&self.key) {
            entry.last_accessed = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use skillforge_types::org::ChatPlatform;

    fn org() -> OrganizationIdentifier {
        OrganizationIdentifier::new(ChatPlatform::Slack, "T1")
    }

    #[tokio::test]
    async fn get_directory_does_not_create() {
        let cache = InMemoryAssemblyCache::new();
        assert!(cache.get_directory(&org()).await.unwrap().is_none());

        cache.get_or_create_directory(&org()).await.unwrap();
        assert!(cache.get_directory(&org()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn upload_download_round_trip() {
        let cache = InMemoryAssemblyCache::new();
        let dir = cache.get_or_create_directory(&org()).await.unwrap();
        let client = dir.artifact(&CacheKey::new("abc"));
        let cancel = CancellationToken::new();

        assert!(!client.exists().await.unwrap());
        client.upload(b"bin", b"sym", &cancel).await.unwrap();
        assert!(client.exists().await.unwrap());
        assert_eq!(client.download_binary().await.unwrap(), b"bin");
        assert_eq!(client.download_symbols().await.unwrap(), b"sym");
    }

    #[tokio::test]
    async fn cancelled_upload_leaves_nothing() {
        let cache = InMemoryAssemblyCache::new();
        let dir = cache.get_or_create_directory(&org()).await.unwrap();
        let client = dir.artifact(&CacheKey::new("abc"));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client.upload(b"bin", b"sym", &cancel).await.unwrap_err();
        assert!(matches!(err, CacheError::Cancelled));
        assert!(!client.exists().await.unwrap());
    }

    #[tokio::test]
    async fn delete_if_exists_is_a_no_op_when_absent() {
        let cache = InMemoryAssemblyCache::new();
        let dir = cache.get_or_create_directory(&org()).await.unwrap();
        let client = dir.artifact(&CacheKey::new("missing"));
        client.delete_if_exists().await.unwrap();
    }

    #[tokio::test]
    async fn list_artifacts_is_restartable() {
        let cache = InMemoryAssemblyCache::new();
        let dir = cache.get_or_create_directory(&org()).await.unwrap();
        let cancel = CancellationToken::new();
        for key in ["a", "b", "c"] {
            dir.artifact(&CacheKey::new(key))
                .upload(b"x", b"y", &cancel)
                .await
                .unwrap();
        }

        let first: Vec<_> = dir.list_artifacts().collect().await;
        let second: Vec<_> = dir.list_artifacts().collect().await;
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
    }

    #[tokio::test]
    async fn last_accessed_round_trips() {
        let cache = InMemoryAssemblyCache::new();
        let dir = cache.get_or_create_directory(&org()).await.unwrap();
        let client = dir.artifact(&CacheKey::new("abc"));
        let cancel = CancellationToken::new();
        client.upload(b"b", b"s", &cancel).await.unwrap();

        assert!(client.last_accessed().await.unwrap().is_none());
        let now = Utc::now();
        client.set_last_accessed(now).await.unwrap();
        assert_eq!(client.last_accessed().await.unwrap(), Some(now));
    }
}
