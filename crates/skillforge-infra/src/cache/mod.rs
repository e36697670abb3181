//! Artifact cache backends: local filesystem and HTTP object store.

pub mod blob;
pub mod local;

pub use blob::{BlobAssemblyCache, BlobStoreConfig};
pub use local::LocalAssemblyCache;
