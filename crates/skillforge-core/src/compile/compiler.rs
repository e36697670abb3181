//! The compiler collaborator trait.
//!
//! The actual per-language compiler is pluggable. This subsystem owns the
//! caching, screening, and publication around it, not the code generation
//! itself.

use skillforge_types::error::{CompilationError, CompileError};
use skillforge_types::skill::Skill;

/// What the compiler produced for a piece of skill source.
///
/// Malformed-but-parseable user code is a `Failure` with diagnostics --
/// never an `Err`. Only infrastructure failures (compiler crash, OOM)
/// travel as [`CompileError`].
#[derive(Debug, Clone)]
pub enum CompileOutcome {
    /// A loadable artifact: executable binary plus debug symbols.
    Success { binary: Vec<u8>, symbols: Vec<u8> },
    /// User-code diagnostics, returned as data.
    Failure(Vec<CompilationError>),
}

/// Trait for the language compiler behind the compilation service.
pub trait SkillCompiler: Send + Sync {
    fn compile(
        &self,
        skill: &Skill,
    ) -> impl std::future::Future<Output = Result<CompileOutcome, CompileError>> + Send;
}
