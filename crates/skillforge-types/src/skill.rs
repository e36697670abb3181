//! Skill identity, languages, and cache-key derivation.
//!
//! A skill is a unit of user-authored automation code in one of the
//! supported languages. Its compiled artifact is addressed by a
//! [`CacheKey`]: a deterministic digest of source, language, and the
//! language's runtime version.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::org::OrganizationIdentifier;

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

/// The languages a skill can be authored in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkillLanguage {
    CSharp,
    Python,
    JavaScript,
    Ink,
}

impl SkillLanguage {
    /// The runtime/compiler version baked into the cache key.
    ///
    /// Bumping one of these invalidates every cached artifact for that
    /// language, which is exactly what a runtime upgrade requires.
    pub const fn runtime_version(self) -> &'static str {
        match self {
            Self::CSharp => "csharp-12.0",
            Self::Python => "python-3.11",
            Self::JavaScript => "node-20",
            Self::Ink => "ink-1.1",
        }
    }

    /// Whether skills in this language are compiled locally to an artifact.
    ///
    /// Interpreted languages are executed from source by their runner and
    /// skip local compilation entirely.
    pub const fn is_compiled(self) -> bool {
        matches!(self, Self::CSharp)
    }

    /// Whether runner endpoints for this language can be overridden.
    ///
    /// Ink always uses the fixed internal runner and is excluded from
    /// override configuration.
    pub const fn is_configurable(self) -> bool {
        !matches!(self, Self::Ink)
    }
}

impl fmt::Display for SkillLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CSharp => write!(f, "csharp"),
            Self::Python => write!(f, "python"),
            Self::JavaScript => write!(f, "javascript"),
            Self::Ink => write!(f, "ink"),
        }
    }
}

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A user-authored skill: identity, language, and source code.
///
/// The source itself is supplied by an external collaborator; this subsystem
/// never fetches or persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub organization: OrganizationIdentifier,
    pub name: String,
    pub language: SkillLanguage,
    pub code: String,
}

impl Skill {
    pub fn new(
        organization: OrganizationIdentifier,
        name: impl Into<String>,
        language: SkillLanguage,
        code: impl Into<String>,
    ) -> Self {
        Self {
            organization,
            name: name.into(),
            language,
            code: code.into(),
        }
    }

    /// The digest input for the cache key.
    ///
    /// Concatenates language, runtime version, and source with newline
    /// separators so that no two distinct inputs collide textually.
    pub fn cache_material(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.language,
            self.language.runtime_version(),
            self.code
        )
    }
}

// ---------------------------------------------------------------------------
// Cache key and artifact
// ---------------------------------------------------------------------------

/// Content address of a compiled artifact: a lowercase hex digest of the
/// skill's cache material.
///
/// A pure function of (source, language, runtime version) -- identical
/// inputs always produce identical keys.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.0)
    }
}

/// A compiled artifact: the executable binary plus its debug symbols.
///
/// Invariant: both blobs are always present. A partially written artifact
/// must never report as existing in any cache backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub key: CacheKey,
    pub binary: Vec<u8>,
    pub symbols: Vec<u8>,
}

impl CompiledArtifact {
    pub fn new(key: CacheKey, binary: Vec<u8>, symbols: Vec<u8>) -> Self {
        Self {
            key,
            binary,
            symbols,
        }
    }
}
