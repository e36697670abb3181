//! HTTP object-store cache backend.
//!
//! Speaks the store's plain HTTP surface: GET/PUT/DELETE per object plus a
//! prefix-list endpoint returning a JSON array of keys. Objects live at
//!
//! ```text
//! {base_url}/{container}/{org-prefix}/{key}/{key}.bin
//! {base_url}/{container}/{org-prefix}/{key}/{key}.sym
//! {base_url}/{container}/{org-prefix}/{key}/{key}.meta
//! ```
//!
//! An object store has no real "missing directory" concept: a directory is
//! a virtual key prefix, so `get_directory` and `get_or_create_directory`
//! behave identically and never report absence. A 404 on download maps to
//! `CacheError::NotFound`, distinct from generic backend failure.
//!
//! Last-accessed uses the same sidecar policy as the local backend: a small
//! `{key}.meta` object holding an RFC3339 timestamp, kept external to the
//! blobs themselves.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::Stream;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use skillforge_core::cache::store::{ArtifactClient, AssemblyCache, CacheDirectory};
use skillforge_types::error::CacheError;
use skillforge_types::org::OrganizationIdentifier;
use skillforge_types::skill::CacheKey;

/// Credentials and location for the object store, supplied by the storage
/// configuration collaborator.
#[derive(Clone)]
pub struct BlobStoreConfig {
    /// Account base URL, e.g. `https://acme.blobs.example`.
    pub base_url: String,
    /// Container holding every organization's artifacts.
    pub container: String,
    /// Access key sent as a bearer token, when the store requires one.
    pub access_key: Option<SecretString>,
}

struct BlobStore {
    http: reqwest::Client,
    config: BlobStoreConfig,
}

impl BlobStore {
    fn object_url(&self, object_key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.container,
            object_key
        )
    }

    fn list_url(&self, prefix: &str) -> String {
        format!(
            "{}/{}?prefix={}/",
            self.config.base_url.trim_end_matches('/'),
            self.config.container,
            prefix
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.access_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    async fn get(&self, object_key: &str) -> Result<Vec<u8>, CacheError> {
        let response = self
            .authorize(self.http.get(self.object_url(object_key)))
            .send()
            .await
            .map_err(|e| CacheError::Backend(format!("GET {object_key}: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CacheError::NotFound(object_key.to_string())),
            status if status.is_success() => response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| CacheError::Backend(format!("GET {object_key} body: {e}"))),
            status => Err(CacheError::Backend(format!(
                "GET {object_key}: status {status}"
            ))),
        }
    }

    async fn head(&self, object_key: &str) -> Result<bool, CacheError> {
        let response = self
            .authorize(self.http.head(self.object_url(object_key)))
            .send()
            .await
            .map_err(|e| CacheError::Backend(format!("HEAD {object_key}: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(CacheError::Backend(format!(
                "HEAD {object_key}: status {status}"
            ))),
        }
    }

    async fn put(&self, object_key: &str, body: Vec<u8>) -> Result<(), CacheError> {
        let response = self
            .authorize(self.http.put(self.object_url(object_key)))
            .body(body)
            .send()
            .await
            .map_err(|e| CacheError::Backend(format!("PUT {object_key}: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CacheError::Backend(format!(
                "PUT {object_key}: status {}",
                response.status()
            )))
        }
    }

    async fn delete(&self, object_key: &str) -> Result<(), CacheError> {
        let response = self
            .authorize(self.http.delete(self.object_url(object_key)))
            .send()
            .await
            .map_err(|e| CacheError::Backend(format!("DELETE {object_key}: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(CacheError::Backend(format!(
                "DELETE {object_key}: status {status}"
            ))),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let response = self
            .authorize(self.http.get(self.list_url(prefix)))
            .send()
            .await
            .map_err(|e| CacheError::Backend(format!("LIST {prefix}: {e}")))?;

        if !response.status().is_success() {
            return Err(CacheError::Backend(format!(
                "LIST {prefix}: status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| CacheError::Backend(format!("LIST {prefix} body: {e}")))
    }
}

/// Object-store-backed [`AssemblyCache`].
pub struct BlobAssemblyCache {
    store: Arc<BlobStore>,
}

impl BlobAssemblyCache {
    pub fn new(config: BlobStoreConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to create reqwest client");
        Self {
            store: Arc::new(BlobStore { http, config }),
        }
    }
}

impl AssemblyCache for BlobAssemblyCache {
    type Dir = BlobDirectory;

    async fn get_or_create_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<BlobDirectory, CacheError> {
        // A virtual prefix needs no creation.
        Ok(BlobDirectory {
            store: self.store.clone(),
            prefix: org.storage_prefix(),
        })
    }

    async fn get_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<Option<BlobDirectory>, CacheError> {
        Ok(Some(self.get_or_create_directory(org).await?))
    }
}

/// A virtual per-organization key prefix.
pub struct BlobDirectory {
    store: Arc<BlobStore>,
    prefix: String,
}

impl BlobDirectory {
    /// Extract the cache key from a listed binary object key, e.g.
    /// `slack-t1/abc/abc.bin` -> `abc`. Non-binary objects yield `None`.
    fn key_of_binary_object(object_key: &str) -> Option<CacheKey> {
        let (folder, file) = object_key.rsplit_once('/')?;
        let key = file.strip_suffix(".bin")?;
        folder.ends_with(key).then(|| CacheKey::new(key))
    }
}

impl CacheDirectory for BlobDirectory {
    type Client = BlobArtifactClient;

    fn artifact(&self, key: &CacheKey) -> BlobArtifactClient {
        BlobArtifactClient {
            store: self.store.clone(),
            prefix: self.prefix.clone(),
            key: key.clone(),
        }
    }

    fn list_artifacts(&self) -> impl Stream<Item = Result<BlobArtifactClient, CacheError>> + Send {
        let store = self.store.clone();
        let prefix = self.prefix.clone();
        async_stream::stream! {
            let keys = match store.list_keys(&prefix).await {
                Ok(keys) => keys,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for object_key in keys {
                let Some(key) = Self::key_of_binary_object(&object_key) else {
                    continue;
                };
                yield Ok(BlobArtifactClient {
                    store: store.clone(),
                    prefix: prefix.clone(),
                    key,
                });
            }
        }
    }
}

/// Client addressing one artifact's pair of objects.
pub struct BlobArtifactClient {
    store: Arc<BlobStore>,
    prefix: String,
    key: CacheKey,
}

impl BlobArtifactClient {
    fn object_key(&self, suffix: &str) -> String {
        format!("{}/{}/{}.{suffix}", self.prefix, self.key, self.key)
    }
}

impl ArtifactClient for BlobArtifactClient {
    fn cache_key(&self) -> &CacheKey {
        &self.key
    }

    async fn exists(&self) -> Result<bool, CacheError> {
        self.store.head(&self.object_key("bin")).await
    }

    async fn symbols_exist(&self) -> Result<bool, CacheError> {
        self.store.head(&self.object_key("sym")).await
    }

    async fn download_binary(&self) -> Result<Vec<u8>, CacheError> {
        self.store.get(&self.object_key("bin")).await
    }

    async fn download_symbols(&self) -> Result<Vec<u8>, CacheError> {
        self.store.get(&self.object_key("sym")).await
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

        // Symbols first; the artifact becomes visible only once the binary
        // object lands.
        self.store
            .put(&self.object_key("sym"), symbols.to_vec())
            .await?;

        if cancel.is_cancelled() {
            // Roll the lone symbols object back; best effort.
            if let Err(e) = self.store.delete(&self.object_key("sym")).await {
                warn!(key = %self.key, error = %e, "failed to roll back symbols object");
            }
            return Err(CacheError::Cancelled);
        }

        self.store
            .put(&self.object_key("bin"), binary.to_vec())
            .await?;
        debug!(key = %self.key, bytes = binary.len(), "artifact published to object store");
        Ok(())
    }

    async fn delete_if_exists(&self) -> Result<(), CacheError> {
        self.store.delete(&self.object_key("bin")).await?;
        self.store.delete(&self.object_key("sym")).await?;
        self.store.delete(&self.object_key("meta")).await
    }

    async fn last_accessed(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        let raw = match self.store.get(&self.object_key("meta")).await {
            Ok(raw) => raw,
            Err(CacheError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let text = String::from_utf8_lossy(&raw);
        match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(at) => Ok(Some(at.with_timezone(&Utc))),
            Err(e) => {
                warn!(key = %self.key, error = %e, "unparseable access sidecar object");
                Ok(None)
            }
        }
    }

    async fn set_last_accessed(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        self.store
            .put(&self.object_key("meta"), at.to_rfc3339().into_bytes())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> BlobStore {
        BlobStore {
            http: reqwest::Client::new(),
            config: BlobStoreConfig {
                base_url: "https://acme.blobs.example/".into(),
                container: "skills".into(),
                access_key: None,
            },
        }
    }

    #[test]
    fn object_url_joins_without_double_slash() {
        let store = store();
        assert_eq!(
            store.object_url("slack-t1/abc/abc.bin"),
            "https://acme.blobs.example/skills/slack-t1/abc/abc.bin"
        );
    }

    #[test]
    fn list_url_carries_prefix() {
        let store = store();
        assert_eq!(
            store.list_url("slack-t1"),
            "https://acme.blobs.example/skills?prefix=slack-t1/"
        );
    }

    #[test]
    fn key_extraction_skips_non_binary_objects() {
        assert_eq!(
            BlobDirectory::key_of_binary_object("slack-t1/abc/abc.bin"),
            Some(CacheKey::new("abc"))
        );
        assert_eq!(
            BlobDirectory::key_of_binary_object("slack-t1/abc/abc.sym"),
            None
        );
        assert_eq!(
            BlobDirectory::key_of_binary_object("slack-t1/abc/abc.meta"),
            None
        );
        assert_eq!(BlobDirectory::key_of_binary_object("stray-object"), None);
    }

    #[tokio::test]
    async fn virtual_directories_never_report_absence() {
        let cache = BlobAssemblyCache::new(BlobStoreConfig {
            base_url: "https://acme.blobs.example".into(),
            container: "skills".into(),
            access_key: None,
        });
        let org = skillforge_types::org::OrganizationIdentifier::new(
            skillforge_types::org::ChatPlatform::Slack,
            "T1",
        );

        // No network round-trip involved: prefixes are virtual.
        assert!(cache.get_directory(&org).await.unwrap().is_some());
    }
}
