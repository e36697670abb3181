//! ContentHasher trait and cache-key derivation.
//!
//! Defined here so the compilation service can derive cache keys without
//! coupling to a specific digest algorithm. The `Sha256ContentHasher`
//! adapter lives in skillforge-infra.

use skillforge_types::skill::{CacheKey, Skill};

/// Abstraction over content hashing for cache-key derivation.
pub trait ContentHasher: Send + Sync {
    /// Compute a lowercase hex-encoded digest of the given content.
    fn compute_hash(&self, content: &str) -> String;
}

/// Derive the cache key for a skill.
///
/// A pure function of the skill's cache material (source, language,
/// runtime version): identical inputs always produce identical keys.
pub fn cache_key_for<H: ContentHasher>(hasher: &H, skill: &Skill) -> CacheKey {
    CacheKey::new(hasher.compute_hash(&skill.cache_material()))
}
