//! Runner defaults loader.
//!
//! Reads `runners.toml` from the data directory and builds the
//! [`RunnerDefaults`] tier of endpoint resolution. Falls back to the fixed
//! internal Ink runner alone when the file is missing or malformed -- the
//! resolver then reports `NotConfigured` for the other languages, which is
//! the correct fatal signal for an unconfigured deployment.
//!
//! Endpoint strings are normalized (legacy `?code=` token split) as they
//! are loaded, never at call time.

use std::path::Path;

use serde::Deserialize;

use skillforge_core::endpoint::resolver::RunnerDefaults;
use skillforge_types::skill::SkillLanguage;

/// The fixed internal Ink runner. Not configurable, not overridable.
const INK_RUNNER_URL: &str = "http://127.0.0.1:7073/api/ink";

/// `runners.toml` shape. Only user-configurable languages appear; Ink is
/// always the internal runner.
#[derive(Debug, Default, Deserialize)]
struct RunnersFile {
    #[serde(default)]
    csharp: Option<String>,
    #[serde(default)]
    python: Option<String>,
    #[serde(default)]
    javascript: Option<String>,
}

/// Load runner defaults from `{data_dir}/runners.toml`.
///
/// - Missing file: internal Ink runner only, logged at debug.
/// - Malformed file: same, with a warning.
/// - Valid file: one default per configured language, plus Ink.
pub async fn load_runner_defaults(data_dir: &Path) -> RunnerDefaults {
    let config_path = data_dir.join("runners.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No runners.toml at {}, using internal defaults", config_path.display());
            return defaults_from(RunnersFile::default());
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using internal defaults", config_path.display());
            return defaults_from(RunnersFile::default());
        }
    };

    match toml::from_str::<RunnersFile>(&content) {
        Ok(file) => defaults_from(file),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using internal defaults",
                config_path.display()
            );
            defaults_from(RunnersFile::default())
        }
    }
}

fn defaults_from(file: RunnersFile) -> RunnerDefaults {
    let mut defaults = RunnerDefaults::new().with_default(SkillLanguage::Ink, INK_RUNNER_URL);
    if let Some(url) = &file.csharp {
        defaults = defaults.with_default(SkillLanguage::CSharp, url);
    }
    if let Some(url) = &file.python {
        defaults = defaults.with_default(SkillLanguage::Python, url);
    }
    if let Some(url) = &file.javascript {
        defaults = defaults.with_default(SkillLanguage::JavaScript, url);
    }
    defaults
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_gives_ink_only() {
        let tmp = TempDir::new().unwrap();
        let defaults = load_runner_defaults(tmp.path()).await;

        assert!(defaults.get(SkillLanguage::Ink).is_some());
        assert!(defaults.get(SkillLanguage::CSharp).is_none());
        assert!(defaults.get(SkillLanguage::Python).is_none());
    }

    #[tokio::test]
    async fn valid_file_loads_and_normalizes() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("runners.toml"),
            r#"
csharp = "https://runners.example/csharp?code=LEGACY"
python = "https://runners.example/python"
"#,
        )
        .await
        .unwrap();

        let defaults = load_runner_defaults(tmp.path()).await;

        let csharp = defaults.get(SkillLanguage::CSharp).unwrap();
        assert_eq!(csharp.url, "https://runners.example/csharp");
        assert_eq!(csharp.token().unwrap().expose_secret(), "LEGACY");

        let python = defaults.get(SkillLanguage::Python).unwrap();
        assert_eq!(python.url, "https://runners.example/python");
        assert!(python.token().is_none());

        assert!(defaults.get(SkillLanguage::JavaScript).is_none());
        assert!(defaults.get(SkillLanguage::Ink).is_some());
    }

    #[tokio::test]
    async fn malformed_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("runners.toml"), "not { valid toml !!!")
            .await
            .unwrap();

        let defaults = load_runner_defaults(tmp.path()).await;
        assert!(defaults.get(SkillLanguage::CSharp).is_none());
        assert!(defaults.get(SkillLanguage::Ink).is_some());
    }
}
