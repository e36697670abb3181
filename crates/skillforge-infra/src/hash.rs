//! SHA-256 content hashing for cache-key derivation.
//!
//! Implements the `ContentHasher` trait from `skillforge-core` using the
//! `sha2` crate (RustCrypto ecosystem).

use sha2::{Digest, Sha256};

use skillforge_core::compile::hash::ContentHasher;

/// SHA-256 implementation of `ContentHasher`.
///
/// Computes lowercase hex-encoded digests of a skill's cache material, so
/// identical (source, language, runtime version) always address the same
/// artifact.
pub struct Sha256ContentHasher;

impl Sha256ContentHasher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Sha256ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher for Sha256ContentHasher {
    fn compute_hash(&self, content: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        format!("{:x}", digest)
    }
}
