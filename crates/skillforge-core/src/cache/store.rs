//! Backend-agnostic artifact cache contract.
//!
//! A cache is a two-level namespace: one directory per organization, each
//! holding artifacts addressed by cache key. An artifact is a binary blob
//! plus a debug-symbols blob that are published as an atomic pair.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).
//! Implementations live in skillforge-infra.

use chrono::{DateTime, Utc};
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use skillforge_types::error::CacheError;
use skillforge_types::org::OrganizationIdentifier;
use skillforge_types::skill::CacheKey;

/// Top-level cache handle, namespaced per organization.
pub trait AssemblyCache: Send + Sync {
    type Dir: CacheDirectory;

    /// Get the organization's directory, creating the namespace if absent.
    fn get_or_create_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> impl std::future::Future<Output = Result<Self::Dir, CacheError>> + Send;

    /// Get the organization's directory without implicit creation.
    ///
    /// Returns `None` when the namespace does not exist. Backends with no
    /// real "missing directory" concept (object stores) behave identically
    /// to [`AssemblyCache::get_or_create_directory`] and never return `None`.
    fn get_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> impl std::future::Future<Output = Result<Option<Self::Dir>, CacheError>> + Send;
}

// A shared reference to a cache is itself a cache.
impl<C: AssemblyCache> AssemblyCache for &C {
    type Dir = C::Dir;

    async fn get_or_create_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<Self::Dir, CacheError> {
        (**self).get_or_create_directory(org).await
    }

    async fn get_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<Option<Self::Dir>, CacheError> {
        (**self).get_directory(org).await
    }
}

/// One organization's artifact namespace.
pub trait CacheDirectory: Send + Sync {
    type Client: ArtifactClient;

    /// A client for the artifact addressed by `key`. Purely addressing;
    /// the artifact may or may not exist.
    fn artifact(&self, key: &CacheKey) -> Self::Client;

    /// Lazily enumerate every artifact in this directory.
    ///
    /// The stream is finite and restartable; the GC driver consumes it to
    /// find entries past the retention window.
    fn list_artifacts(&self) -> impl Stream<Item = Result<Self::Client, CacheError>> + Send;
}

/// Operations on a single cached artifact.
///
/// Existence is defined by binary presence. Uploads publish the symbols
/// before the binary, so `exists() == true` implies both blobs are
/// retrievable; a reader that still finds a lone blob treats the artifact
/// as not cached.
pub trait ArtifactClient: Send + Sync {
    /// The key this client addresses.
    fn cache_key(&self) -> &CacheKey;

    /// Whether the artifact exists (binary blob present).
    fn exists(&self) -> impl std::future::Future<Output = Result<bool, CacheError>> + Send;

    /// Whether the debug symbols blob is present.
    fn symbols_exist(&self) -> impl std::future::Future<Output = Result<bool, CacheError>> + Send;

    /// Download the binary. `CacheError::NotFound` when absent.
    fn download_binary(&self) -> impl std::future::Future<Output = Result<Vec<u8>, CacheError>> + Send;

    /// Download the debug symbols. `CacheError::NotFound` when absent.
    fn download_symbols(&self) -> impl std::future::Future<Output = Result<Vec<u8>, CacheError>> + Send;

    /// Publish the binary/symbols pair atomically.
    ///
    /// A cancelled upload must leave nothing visible: either the artifact
    /// exists with both blobs or it does not exist at all.
    fn upload(
        &self,
        binary: &[u8],
        symbols: &[u8],
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;

    /// Delete the artifact. A no-op when absent; never errors on absence.
    fn delete_if_exists(&self) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;

    /// When the artifact was last accessed, `None` if never recorded.
    fn last_accessed(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<DateTime<Utc>>, CacheError>> + Send;

    /// Record an access time for GC retention decisions.
    fn set_last_accessed(
        &self,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;
}
