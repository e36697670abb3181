//! Infrastructure layer for Skillforge.
//!
//! Contains implementations of the port traits defined in `skillforge-core`:
//! the local-filesystem and object-store cache backends, the HTTP runner
//! transport, SHA-256 hashing, and the runner-defaults configuration loader.

pub mod cache;
pub mod config;
pub mod hash;
pub mod runner;

#[cfg(test)]
mod pipeline_tests {
    //! End-to-end: compile -> cache -> resolve -> dispatch, with the real
    //! hasher and filesystem backend and a scripted runner transport.

    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    use skillforge_core::cache::store::{ArtifactClient, AssemblyCache, CacheDirectory};
    use skillforge_core::compile::compiler::{CompileOutcome, SkillCompiler};
    use skillforge_core::compile::service::{CompilationService, CompileResult};
    use skillforge_core::dispatch::dispatcher::{ExecutionDispatcher, SkillRunner};
    use skillforge_core::dispatch::retry::FixedDelayRetry;
    use skillforge_core::endpoint::resolver::{EndpointResolver, RunnerDefaults};
    use skillforge_core::endpoint::store::InMemoryOverrideStore;
    use skillforge_types::error::{CompileError, DispatchError};
    use skillforge_types::org::{ChatPlatform, OrganizationIdentifier};
    use skillforge_types::runner::{RunnerEndpoint, SkillRunRequest, SkillRunResponse};
    use skillforge_types::skill::{Skill, SkillLanguage};

    use crate::cache::LocalAssemblyCache;
    use crate::hash::Sha256ContentHasher;

    /// Wraps the skill body into deterministic fake blobs.
    struct StubCompiler;

    impl SkillCompiler for StubCompiler {
        async fn compile(&self, skill: &Skill) -> Result<CompileOutcome, CompileError> {
            Ok(CompileOutcome::Success {
                binary: format!("IL:{}", skill.code).into_bytes(),
                symbols: format!("PDB:{}", skill.code).into_bytes(),
            })
        }
    }

    /// Replies "hi" to whatever it is asked to run.
    struct GreetingRunner;

    impl SkillRunner for GreetingRunner {
        async fn run(
            &self,
            _endpoint: &RunnerEndpoint,
            _request: &SkillRunRequest,
            _cancel: &CancellationToken,
        ) -> Result<SkillRunResponse, DispatchError> {
            Ok(SkillRunResponse::succeeded(
                vec!["hi".into()],
                Default::default(),
            ))
        }
    }

    #[tokio::test]
    async fn greet_compiles_caches_and_dispatches() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalAssemblyCache::new(tmp.path());
        let org = OrganizationIdentifier::new(ChatPlatform::Slack, "O1");
        let skill = Skill::new(org.clone(), "greet", SkillLanguage::CSharp, "Reply(\"hi\")");
        let cancel = CancellationToken::new();

        // Compile and publish to the filesystem cache.
        let service = CompilationService::new(&cache, StubCompiler, Sha256ContentHasher::new());
        let CompileResult::Compiled(key) = service.compile(&skill, &cancel).await.unwrap() else {
            panic!("expected compiled result");
        };

        // Recompiling identical input yields the identical key.
        let CompileResult::Compiled(key_again) = service.compile(&skill, &cancel).await.unwrap()
        else {
            panic!("expected compiled result");
        };
        assert_eq!(key, key_again);

        // Downloading returns byte-identical content for both blobs.
        let dir = cache.get_directory(&org).await.unwrap().unwrap();
        let client = dir.artifact(&key);
        assert_eq!(client.download_binary().await.unwrap(), b"IL:Reply(\"hi\")");
        assert_eq!(client.download_symbols().await.unwrap(), b"PDB:Reply(\"hi\")");

        // Resolve the endpoint and dispatch the run.
        let resolver = EndpointResolver::new(
            InMemoryOverrideStore::new(),
            RunnerDefaults::new()
                .with_default(SkillLanguage::CSharp, "https://runners.example/csharp"),
        );
        let endpoint = resolver.resolve(&org, skill.language).await.unwrap();

        let dispatcher = ExecutionDispatcher::new(GreetingRunner, FixedDelayRetry::default());
        let request = SkillRunRequest::new(&skill.name, "", &skill.code);
        let response = dispatcher.dispatch(&endpoint, &request, &cancel).await.unwrap();

        assert!(response.success);
        assert_eq!(response.replies, vec!["hi"]);
        assert!(response.errors.is_empty());
    }
}
