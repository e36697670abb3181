//! The compilation service: turns skill source into a cached artifact or a
//! list of compile diagnostics.
//!
//! For the compiled language the pipeline is: screen imports against the
//! sandbox allow-list, derive the cache key, short-circuit on a complete
//! cached pair, otherwise invoke the compiler collaborator and publish the
//! result atomically. Interpreted languages pass through untouched -- their
//! runners report syntax errors on first execution.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use skillforge_types::error::{CompilationError, CompileError};
use skillforge_types::skill::{CacheKey, Skill};

use crate::cache::{ArtifactClient, AssemblyCache, CacheDirectory};

use super::allowlist;
use super::compiler::{CompileOutcome, SkillCompiler};
use super::hash::{ContentHasher, cache_key_for};

/// What compiling a skill produced.
#[derive(Debug, Clone)]
pub enum CompileResult {
    /// A loadable artifact is cached under this key.
    Compiled(CacheKey),
    /// The language is interpreted; the runner validates on first execution.
    Interpreted,
    /// User-code diagnostics. Never an `Err`.
    Failed(Vec<CompilationError>),
}

/// Orchestrates screening, compilation, and artifact publication.
pub struct CompilationService<C, K, H> {
    cache: C,
    compiler: K,
    hasher: H,
}

impl<C, K, H> CompilationService<C, K, H>
where
    C: AssemblyCache,
    K: SkillCompiler,
    H: ContentHasher,
{
    pub fn new(cache: C, compiler: K, hasher: H) -> Self {
        Self {
            cache,
            compiler,
            hasher,
        }
    }

    /// The cache key this skill's artifact is addressed by.
    pub fn cache_key(&self, skill: &Skill) -> CacheKey {
        cache_key_for(&self.hasher, skill)
    }

    /// Compile a skill, using the cache when a complete artifact exists.
    ///
    /// Concurrent compiles of the same key may race; last-write-wins is
    /// fine because content is deterministic for identical inputs.
    pub async fn compile(
        &self,
        skill: &Skill,
        cancel: &CancellationToken,
    ) -> Result<CompileResult, CompileError> {
        if !skill.language.is_compiled() {
            debug!(skill = %skill.name, language = %skill.language, "interpreted language, pass-through");
            return Ok(CompileResult::Interpreted);
        }

        let violations = allowlist::validate_imports(&skill.code);
        if !violations.is_empty() {
            debug!(
                skill = %skill.name,
                count = violations.len(),
                "rejected by sandbox allow-list"
            );
            return Ok(CompileResult::Failed(violations));
        }

        let key = self.cache_key(skill);
        let directory = self.cache.get_or_create_directory(&skill.organization).await?;
        let client = directory.artifact(&key);

        // A pair-incomplete artifact counts as not cached and is recompiled.
        if client.exists().await? && client.symbols_exist().await? {
            debug!(skill = %skill.name, %key, "artifact cache hit");
            return Ok(CompileResult::Compiled(key));
        }

        match self.compiler.compile(skill).await? {
            CompileOutcome::Failure(errors) => Ok(CompileResult::Failed(errors)),
            CompileOutcome::Success { binary, symbols } => {
                client.upload(&binary, &symbols, cancel).await?;
                debug!(skill = %skill.name, %key, bytes = binary.len(), "artifact compiled and cached");
                Ok(CompileResult::Compiled(key))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use skillforge_types::org::{ChatPlatform, OrganizationIdentifier};
    use skillforge_types::skill::SkillLanguage;

    use crate::cache::InMemoryAssemblyCache;

    /// Deterministic fake digest for tests.
    struct StubHasher;

    impl ContentHasher for StubHasher {
        fn compute_hash(&self, content: &str) -> String {
            format!("{:016x}", content.len() as u64 * 31 + content.bytes().map(u64::from).sum::<u64>())
        }
    }

    /// Compiler that emits fixed blobs and counts invocations.
    struct CountingCompiler {
        calls: AtomicU32,
    }

    impl CountingCompiler {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SkillCompiler for &CountingCompiler {
        async fn compile(&self, skill: &Skill) -> Result<CompileOutcome, CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompileOutcome::Success {
                binary: format!("bin:{}", skill.code).into_bytes(),
                symbols: format!("sym:{}", skill.code).into_bytes(),
            })
        }
    }

    /// Compiler that always reports a user-code diagnostic.
    struct FailingCompiler;

    impl SkillCompiler for FailingCompiler {
        async fn compile(&self, _skill: &Skill) -> Result<CompileOutcome, CompileError> {
            Ok(CompileOutcome::Failure(vec![CompilationError {
                error_id: "CS1002".into(),
                description: "; expected".into(),
                line_start: 1,
                line_end: 1,
                span_start: 10,
                span_end: 11,
            }]))
        }
    }

    fn org() -> OrganizationIdentifier {
        OrganizationIdentifier::new(ChatPlatform::Slack, "T1")
    }

    fn csharp(code: &str) -> Skill {
        Skill::new(org(), "greet", SkillLanguage::CSharp, code)
    }

    #[tokio::test]
    async fn interpreted_language_is_pass_through() {
        let compiler = CountingCompiler::new();
        let service = CompilationService::new(InMemoryAssemblyCache::new(), &compiler, StubHasher);
        let skill = Skill::new(org(), "hi", SkillLanguage::Python, "reply('hi')");

        let result = service.compile(&skill, &CancellationToken::new()).await.unwrap();
        assert!(matches!(result, CompileResult::Interpreted));
        assert_eq!(compiler.calls(), 0);
    }

    #[tokio::test]
    async fn compiles_and_caches_then_hits() {
        let compiler = CountingCompiler::new();
        let service = CompilationService::new(InMemoryAssemblyCache::new(), &compiler, StubHasher);
        let skill = csharp("Reply(\"hi\");");
        let cancel = CancellationToken::new();

        let first = service.compile(&skill, &cancel).await.unwrap();
        let CompileResult::Compiled(key_a) = first else {
            panic!("expected compiled result");
        };

        let second = service.compile(&skill, &cancel).await.unwrap();
        let CompileResult::Compiled(key_b) = second else {
            panic!("expected compiled result");
        };

        assert_eq!(key_a, key_b, "identical inputs must produce identical keys");
        assert_eq!(compiler.calls(), 1, "second compile must be a cache hit");
    }

    #[tokio::test]
    async fn source_change_produces_new_key() {
        let compiler = CountingCompiler::new();
        let service = CompilationService::new(InMemoryAssemblyCache::new(), &compiler, StubHasher);
        let cancel = CancellationToken::new();

        let CompileResult::Compiled(key_a) = service
            .compile(&csharp("Reply(\"hi\");"), &cancel)
            .await
            .unwrap()
        else {
            panic!("expected compiled result");
        };
        let CompileResult::Compiled(key_b) = service
            .compile(&csharp("Reply(\"bye\");"), &cancel)
            .await
            .unwrap()
        else {
            panic!("expected compiled result");
        };

        assert_ne!(key_a, key_b);
        assert_eq!(compiler.calls(), 2);
    }

    #[tokio::test]
    async fn allow_list_violation_is_data_not_error() {
        let compiler = CountingCompiler::new();
        let service = CompilationService::new(InMemoryAssemblyCache::new(), &compiler, StubHasher);
        let skill = csharp("using System.IO;\nFile.Delete(\"/\");");

        let result = service
            .compile(&skill, &CancellationToken::new())
            .await
            .unwrap();
        let CompileResult::Failed(errors) = result else {
            panic!("expected failed result");
        };
        assert_eq!(errors[0].error_id, "SF0401");
        assert_eq!(compiler.calls(), 0, "compiler must not see rejected source");
    }

    #[tokio::test]
    async fn compiler_diagnostics_come_back_as_data() {
        let service =
            CompilationService::new(InMemoryAssemblyCache::new(), FailingCompiler, StubHasher);
        let result = service
            .compile(&csharp("Reply(\"hi\")"), &CancellationToken::new())
            .await
            .unwrap();

        let CompileResult::Failed(errors) = result else {
            panic!("expected failed result");
        };
        assert_eq!(errors[0].error_id, "CS1002");
    }

    #[tokio::test]
    async fn artifact_round_trips_byte_identical() {
        let compiler = CountingCompiler::new();
        let cache = InMemoryAssemblyCache::new();
        let skill = csharp("Reply(\"hi\");");
        let cancel = CancellationToken::new();

        let key = {
            let service = CompilationService::new(&cache, &compiler, StubHasher);
            let CompileResult::Compiled(key) = service.compile(&skill, &cancel).await.unwrap()
            else {
                panic!("expected compiled result");
            };
            key
        };

        let dir = cache
            .get_directory(&org())
            .await
            .unwrap()
            .expect("directory created by compile");
        let client = dir.artifact(&key);
        assert_eq!(client.download_binary().await.unwrap(), b"bin:Reply(\"hi\");");
        assert_eq!(client.download_symbols().await.unwrap(), b"sym:Reply(\"hi\");");
    }
}
