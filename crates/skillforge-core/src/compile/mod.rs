//! Skill compilation: allow-list screening, cache-key derivation, compiler
//! invocation, and artifact publication.

pub mod allowlist;
pub mod compiler;
pub mod hash;
pub mod loader;
pub mod service;

pub use compiler::{CompileOutcome, SkillCompiler};
pub use service::{CompilationService, CompileResult};
