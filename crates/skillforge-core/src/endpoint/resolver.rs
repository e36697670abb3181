//! Three-tier runner endpoint resolution.
//!
//! Most specific wins: (1) the organization's own override, (2) the global
//! operator override, (3) the built-in default from static configuration.
//! Ink is the exception -- it always runs on the fixed internal runner and
//! both override tiers are skipped.

use tracing::debug;

use skillforge_types::error::ResolveError;
use skillforge_types::org::OrganizationIdentifier;
use skillforge_types::runner::RunnerEndpoint;
use skillforge_types::skill::SkillLanguage;

use super::store::EndpointOverrideStore;

/// Built-in per-language defaults, loaded once from static configuration.
///
/// Raw endpoint strings are normalized through [`RunnerEndpoint::parse`] at
/// construction -- legacy `?code=` tokens are split here, never at call
/// time.
#[derive(Debug, Default)]
pub struct RunnerDefaults {
    csharp: Option<RunnerEndpoint>,
    python: Option<RunnerEndpoint>,
    javascript: Option<RunnerEndpoint>,
    ink: Option<RunnerEndpoint>,
}

impl RunnerDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default for a language from a raw endpoint string.
    pub fn with_default(mut self, language: SkillLanguage, raw: &str) -> Self {
        let endpoint = RunnerEndpoint::parse(raw);
        match language {
            SkillLanguage::CSharp => self.csharp = Some(endpoint),
            SkillLanguage::Python => self.python = Some(endpoint),
            SkillLanguage::JavaScript => self.javascript = Some(endpoint),
            SkillLanguage::Ink => self.ink = Some(endpoint),
        }
        self
    }

    pub fn get(&self, language: SkillLanguage) -> Option<&RunnerEndpoint> {
        match language {
            SkillLanguage::CSharp => self.csharp.as_ref(),
            SkillLanguage::Python => self.python.as_ref(),
            SkillLanguage::JavaScript => self.javascript.as_ref(),
            SkillLanguage::Ink => self.ink.as_ref(),
        }
    }
}

/// Resolves the runner endpoint for an (organization, language) pair.
pub struct EndpointResolver<S> {
    store: S,
    defaults: RunnerDefaults,
}

impl<S: EndpointOverrideStore> EndpointResolver<S> {
    pub fn new(store: S, defaults: RunnerDefaults) -> Self {
        Self { store, defaults }
    }

    /// Resolve the endpoint, most specific tier first.
    ///
    /// Missing everywhere is [`ResolveError::NotConfigured`]: a fatal
    /// configuration error, surfaced to the caller and never retried.
    pub async fn resolve(
        &self,
        org: &OrganizationIdentifier,
        language: SkillLanguage,
    ) -> Result<RunnerEndpoint, ResolveError> {
        if language.is_configurable() {
            if let Some(endpoint) = self.store.org_override(org, language).await {
                debug!(%org, %language, "resolved endpoint from org override");
                return Ok(endpoint);
            }
            if let Some(endpoint) = self.store.global_override(language).await {
                debug!(%org, %language, "resolved endpoint from global override");
                return Ok(endpoint);
            }
        }

        self.defaults
            .get(language)
            .cloned()
            .ok_or_else(|| ResolveError::NotConfigured(language.to_string()))
    }

    /// Set an organization override from a raw endpoint string.
    ///
    /// Normalizes the legacy `?code=` form at write time. Rejected for
    /// languages that are not user-configurable.
    pub async fn set_org_override(
        &self,
        org: &OrganizationIdentifier,
        language: SkillLanguage,
        raw: &str,
    ) -> Result<(), ResolveError> {
        if !language.is_configurable() {
            return Err(ResolveError::NotConfigurable(language.to_string()));
        }
        self.store
            .set_org_override(org, language, RunnerEndpoint::parse(raw))
            .await;
        Ok(())
    }

    pub async fn clear_org_override(&self, org: &OrganizationIdentifier, language: SkillLanguage) {
        self.store.clear_org_override(org, language).await;
    }

    /// Set the operator-level override (incident response, migrations).
    pub async fn set_global_override(
        &self,
        language: SkillLanguage,
        raw: &str,
    ) -> Result<(), ResolveError> {
        if !language.is_configurable() {
            return Err(ResolveError::NotConfigurable(language.to_string()));
        }
        self.store
            .set_global_override(language, RunnerEndpoint::parse(raw))
            .await;
        Ok(())
    }

    pub async fn clear_global_override(&self, language: SkillLanguage) {
        self.store.clear_global_override(language).await;
    }
}
