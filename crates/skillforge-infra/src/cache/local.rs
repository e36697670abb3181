//! Local filesystem cache backend.
//!
//! Layout per organization:
//!
//! ```text
//! {root}/{org-prefix}/
//!   {key}/
//!     {key}.bin    executable binary
//!     {key}.sym    debug symbols
//!     {key}.meta   last-accessed sidecar (RFC3339)
//! ```
//!
//! Publication is write-temp-then-rename, symbols before binary, so a
//! reader never observes a binary without retrievable symbols. Existence is
//! defined by binary presence: a cancelled or crashed upload leaves at most
//! invisible temporaries and a lone symbols file, both of which read as
//! "not cached".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use skillforge_core::cache::store::{ArtifactClient, AssemblyCache, CacheDirectory};
use skillforge_types::error::CacheError;
use skillforge_types::org::OrganizationIdentifier;
use skillforge_types::skill::CacheKey;

fn io_err(context: &str, err: std::io::Error) -> CacheError {
    CacheError::Io(format!("{context}: {err}"))
}

/// Filesystem-backed [`AssemblyCache`] rooted at a configured directory.
pub struct LocalAssemblyCache {
    root: PathBuf,
}

impl LocalAssemblyCache {
    /// Create a cache rooted at `root`. The root itself is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn org_dir(&self, org: &OrganizationIdentifier) -> PathBuf {
        self.root.join(org.storage_prefix())
    }
}

impl AssemblyCache for LocalAssemblyCache {
    type Dir = LocalDirectory;

    async fn get_or_create_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<LocalDirectory, CacheError> {
        let path = self.org_dir(org);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| io_err("create org directory", e))?;
        Ok(LocalDirectory { path })
    }

    async fn get_directory(
        &self,
        org: &OrganizationIdentifier,
    ) -> Result<Option<LocalDirectory>, CacheError> {
        let path = self.org_dir(org);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(LocalDirectory { path })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err("stat org directory", e)),
        }
    }
}

/// One organization's folder of artifacts.
pub struct LocalDirectory {
    path: PathBuf,
}

impl CacheDirectory for LocalDirectory {
    type Client = LocalArtifactClient;

    fn artifact(&self, key: &CacheKey) -> LocalArtifactClient {
        LocalArtifactClient {
            key: key.clone(),
            dir: self.path.join(key.as_str()),
        }
    }

    fn list_artifacts(&self) -> impl Stream<Item = Result<LocalArtifactClient, CacheError>> + Send {
        let path = self.path.clone();
        async_stream::stream! {
            let mut entries = match tokio::fs::read_dir(&path).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return,
                Err(e) => {
                    yield Err(io_err("list org directory", e));
                    return;
                }
            };

            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        let Ok(name) = entry.file_name().into_string() else {
                            continue;
                        };
                        let Ok(file_type) = entry.file_type().await else {
                            continue;
                        };
                        if !file_type.is_dir() {
                            continue;
                        }
                        yield Ok(LocalArtifactClient {
                            key: CacheKey::new(&name),
                            dir: entry.path(),
                        });
                    }
                    Ok(None) => return,
                    Err(e) => {
                        yield Err(io_err("enumerate artifacts", e));
                        return;
                    }
                }
            }
        }
    }
}

/// Client addressing one artifact folder.
pub struct LocalArtifactClient {
    key: CacheKey,
    dir: PathBuf,
}

impl LocalArtifactClient {
    fn binary_path(&self) -> PathBuf {
        self.dir.join(format!("{}.bin", self.key))
    }

    fn symbols_path(&self) -> PathBuf {
        self.dir.join(format!("{}.sym", self.key))
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(format!("{}.meta", self.key))
    }

    async fn read_blob(&self, path: &Path) -> Result<Vec<u8>, CacheError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CacheError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(io_err("read artifact blob", e)),
        }
    }

    async fn file_exists(path: &Path) -> Result<bool, CacheError> {
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err("stat artifact blob", e)),
        }
    }

    async fn remove_if_present(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove cache file");
            }
        }
    }
}

impl ArtifactClient for LocalArtifactClient {
    fn cache_key(&self) -> &CacheKey {
        &self.key
    }

    async fn exists(&self) -> Result<bool, CacheError> {
        Self::file_exists(&self.binary_path()).await
    }

    async fn symbols_exist(&self) -> Result<bool, CacheError> {
        Self::file_exists(&self.symbols_path()).await
    }

    async fn download_binary(&self) -> Result<Vec<u8>, CacheError> {
        self.read_blob(&self.binary_path()).await
    }

    async fn download_symbols(&self) -> Result<Vec<u8>, CacheError> {
        self.read_blob(&self.symbols_path()).await
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

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err("create artifact directory", e))?;

        let sym_tmp = self.dir.join(format!("{}.sym.tmp", self.key));
        let bin_tmp = self.dir.join(format!("{}.bin.tmp", self.key));

        tokio::fs::write(&sym_tmp, symbols)
            .await
            .map_err(|e| io_err("write symbols", e))?;
        tokio::fs::write(&bin_tmp, binary)
            .await
            .map_err(|e| io_err("write binary", e))?;

        // Last cancellation point before anything becomes visible.
        if cancel.is_cancelled() {
            Self::remove_if_present(&sym_tmp).await;
            Self::remove_if_present(&bin_tmp).await;
            return Err(CacheError::Cancelled);
        }

        // Symbols first: existence is defined by binary presence, so once
        // the binary rename lands the pair is complete.
        tokio::fs::rename(&sym_tmp, self.symbols_path())
            .await
            .map_err(|e| io_err("publish symbols", e))?;
        tokio::fs::rename(&bin_tmp, self.binary_path())
            .await
            .map_err(|e| io_err("publish binary", e))?;

        debug!(key = %self.key, bytes = binary.len(), "artifact published");
        Ok(())
    }

    async fn delete_if_exists(&self) -> Result<(), CacheError> {
        Self::remove_if_present(&self.binary_path()).await;
        Self::remove_if_present(&self.symbols_path()).await;
        Self::remove_if_present(&self.meta_path()).await;

        if let Err(e) = tokio::fs::remove_dir(&self.dir).await {
            match e.kind() {
                ErrorKind::NotFound => {}
                // Stray temporaries keep the folder; they read as absent.
                ErrorKind::DirectoryNotEmpty => {
                    debug!(key = %self.key, "artifact folder not empty after delete");
                }
                _ => return Err(io_err("remove artifact directory", e)),
            }
        }
        Ok(())
    }

    async fn last_accessed(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        let raw = match tokio::fs::read_to_string(self.meta_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err("read access sidecar", e)),
        };

        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Ok(Some(at.with_timezone(&Utc))),
            Err(e) => {
                warn!(key = %self.key, error = %e, "unparseable access sidecar");
                Ok(None)
            }
        }
    }

    async fn set_last_accessed(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err("create artifact directory", e))?;
        tokio::fs::write(self.meta_path(), at.to_rfc3339())
            .await
            .map_err(|e| io_err("write access sidecar", e))
    }
}
