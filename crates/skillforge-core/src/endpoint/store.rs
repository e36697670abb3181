//! Endpoint override storage.
//!
//! Overrides are explicit administrative state with defined read, write,
//! and clear operations at two scopes -- per organization and global. The
//! store is constructed and injected; there is no process-global static.

use dashmap::DashMap;

use skillforge_types::org::OrganizationIdentifier;
use skillforge_types::runner::RunnerEndpoint;
use skillforge_types::skill::SkillLanguage;

/// Storage for endpoint overrides at both scopes.
///
/// Implementations must persist whatever an administrator sets until it is
/// explicitly cleared. Uses RPITIT; the in-memory implementation below
/// suits tests and single-process deployments.
pub trait EndpointOverrideStore: Send + Sync {
    fn org_override(
        &self,
        org: &OrganizationIdentifier,
        language: SkillLanguage,
    ) -> impl std::future::Future<Output = Option<RunnerEndpoint>> + Send;

    fn set_org_override(
        &self,
        org: &OrganizationIdentifier,
        language: SkillLanguage,
        endpoint: RunnerEndpoint,
    ) -> impl std::future::Future<Output = ()> + Send;

    fn clear_org_override(
        &self,
        org: &OrganizationIdentifier,
        language: SkillLanguage,
    ) -> impl std::future::Future<Output = ()> + Send;

    fn global_override(
        &self,
        language: SkillLanguage,
    ) -> impl std::future::Future<Output = Option<RunnerEndpoint>> + Send;

    fn set_global_override(
        &self,
        language: SkillLanguage,
        endpoint: RunnerEndpoint,
    ) -> impl std::future::Future<Output = ()> + Send;

    fn clear_global_override(
        &self,
        language: SkillLanguage,
    ) -> impl std::future::Future<Output = ()> + Send;
}

/// Dashmap-backed override store.
#[derive(Default)]
pub struct InMemoryOverrideStore {
    org: DashMap<(OrganizationIdentifier, SkillLanguage), RunnerEndpoint>,
    global: DashMap<SkillLanguage, RunnerEndpoint>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EndpointOverrideStore for InMemoryOverrideStore {
    async fn org_override(
        &self,
        org: &OrganizationIdentifier,
        language: SkillLanguage,
    ) -> Option<RunnerEndpoint> {
        self.org
            .get(&(org.clone(), language))
            .map(|entry| entry.value().clone())
    }

    async fn set_org_override(
        &self,
        org: &OrganizationIdentifier,
        language: SkillLanguage,
        endpoint: RunnerEndpoint,
    ) {
        self.org.insert((org.clone(), language), endpoint);
    }

    async fn clear_org_override(&self, org: &OrganizationIdentifier, language: SkillLanguage) {
        self.org.remove(&(org.clone(), language));
    }

    async fn global_override(&self, language: SkillLanguage) -> Option<RunnerEndpoint> {
        self.global.get(&language).map(|entry| entry.value().clone())
    }

    async fn set_global_override(&self, language: SkillLanguage, endpoint: RunnerEndpoint) {
        self.global.insert(language, endpoint);
    }

    async fn clear_global_override(&self, language: SkillLanguage) {
        self.global.remove(&language);
    }
}
