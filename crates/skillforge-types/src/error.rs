//! Error taxonomy for the Skillforge subsystem.
//!
//! Two distinct families:
//!
//! - User-code defects ([`CompilationError`], [`RuntimeError`]) are plain
//!   data, carried inside response envelopes and never raised as `Err`
//!   past a component boundary.
//! - Infrastructure failures are the `thiserror` enums below, surfaced to
//!   the caller and eligible for retry only per the dispatch rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// User-code defects (data, not exceptions)
// ---------------------------------------------------------------------------

/// A defect in user-authored skill code found at compile time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompilationError {
    pub error_id: String,
    pub description: String,
    pub line_start: u32,
    pub line_end: u32,
    pub span_start: u32,
    pub span_end: u32,
}

/// A defect surfaced while running skill code, with an optional stack trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeError {
    pub error_id: String,
    pub description: String,
    #[serde(default)]
    pub line_start: u32,
    #[serde(default)]
    pub line_end: u32,
    #[serde(default)]
    pub span_start: u32,
    #[serde(default)]
    pub span_end: u32,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

impl RuntimeError {
    /// A runtime error with no source location (synthetic failures,
    /// runner-side errors without position information).
    pub fn from_description(error_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            error_id: error_id.into(),
            description: description.into(),
            line_start: 0,
            line_end: 0,
            span_start: 0,
            span_end: 0,
            stack_trace: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Infrastructure failures
// ---------------------------------------------------------------------------

/// Errors from artifact cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The requested object does not exist. Distinct from generic I/O
    /// failure so callers can treat it as "not cached".
    #[error("artifact object not found: {0}")]
    NotFound(String),

    #[error("storage io error: {0}")]
    Io(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    /// The operation observed cancellation and stopped before publishing.
    #[error("cache operation cancelled")]
    Cancelled,
}

impl CacheError {
    /// Whether this error means the object is simply absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Infrastructure failures during compilation (compiler crash, OOM).
///
/// Malformed user code is never a `CompileError`; it comes back as a list
/// of [`CompilationError`] values inside the compile result.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compiler failure: {0}")]
    Compiler(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Endpoint resolution failures. Fatal configuration errors, never retried.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no runner endpoint configured for language '{0}'")]
    NotConfigured(String),

    #[error("runner endpoint for language '{0}' is not user-configurable")]
    NotConfigurable(String),
}

/// Dispatch failures, classified by when they occurred relative to remote
/// execution.
///
/// Only [`DispatchError::Connect`] happened before any remote code could
/// run; everything else means the remote call was accepted (or timed out in
/// flight) and must not be retried automatically.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// DNS failure, connection refused, or TLS handshake failure.
    #[error("connection to runner failed: {0}")]
    Connect(String),

    /// The request was sent but no response arrived in time.
    #[error("runner call timed out after {0:?}")]
    Timeout(Duration),

    /// The runner responded with a non-success HTTP status.
    #[error("runner returned status {status}")]
    Endpoint { status: u16 },

    /// A response body arrived but could not be decoded as the envelope.
    #[error("undecodable runner response: {0}")]
    Protocol(String),

    #[error("dispatch cancelled")]
    Cancelled,
}

impl DispatchError {
    /// True only for failures that happened before any remote code executed,
    /// which are safe to retry transparently.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}

/// Failures while resolving signal subscriptions.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("subscription lookup failed: {0}")]
    Directory(String),
}

/// Typed-accessor failures on [`crate::value::SkillValue`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}
