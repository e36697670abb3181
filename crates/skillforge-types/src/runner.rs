//! Runner endpoints and the run request/response envelopes.
//!
//! A runner is an external per-language execution endpoint. The wire
//! contract is `POST {endpoint}` with JSON `{name, arguments, code}`,
//! bearer-authenticated when a token is configured, answered by a JSON
//! [`SkillRunResponse`].
//!
//! The bearer token is wrapped in [`secrecy::SecretString`] and never
//! appears in `Debug` output or logs.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;
use crate::signal::SignalEvent;
use crate::value::SkillValue;

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// A resolved runner endpoint: the URL plus an optional bearer token.
#[derive(Clone)]
pub struct RunnerEndpoint {
    pub url: String,
    token: Option<SecretString>,
}

impl RunnerEndpoint {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token: token.map(SecretString::from),
        }
    }

    /// Parse an endpoint string, normalizing the legacy token form.
    ///
    /// Older configurations embed the token as a `?code=TOKEN` query
    /// parameter. That form is split into `{url-without-code, token}` here,
    /// at load time -- callers never see the embedded variant. Query
    /// parameters other than `code` are preserved.
    pub fn parse(raw: &str) -> Self {
        let Some((base, query)) = raw.split_once('?') else {
            return Self::new(raw, None);
        };

        let mut token = None;
        let mut kept = Vec::new();
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("code", value)) => token = Some(value.to_string()),
                _ => kept.push(pair),
            }
        }

        let url = if kept.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{}", kept.join("&"))
        };
        Self::new(url, token)
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }
}

impl fmt::Debug for RunnerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerEndpoint")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Request / response envelopes
// ---------------------------------------------------------------------------

/// The run request sent to a runner endpoint.
///
/// When a run is triggered by a signal, the full event -- including Source
/// and the immutable RootSource chain -- rides along so the handler skill
/// can see its provenance. Plain runs omit the field entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRunRequest {
    #[serde(rename = "name")]
    pub skill_name: String,
    pub arguments: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<SignalEvent>,
}

impl SkillRunRequest {
    pub fn new(
        skill_name: impl Into<String>,
        arguments: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            skill_name: skill_name.into(),
            arguments: arguments.into(),
            code: code.into(),
            signal: None,
        }
    }

    /// Attach the signal event that triggered this run.
    pub fn with_signal(mut self, event: SignalEvent) -> Self {
        self.signal = Some(event);
        self
    }
}

/// The uniform response envelope every dispatch produces.
///
/// Success carries the ordered replies and the outputs map; failure carries
/// runtime errors and an empty reply list. User-code defects always travel
/// here as data, never as `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRunResponse {
    pub success: bool,
    #[serde(default)]
    pub replies: Vec<String>,
    #[serde(default)]
    pub errors: Vec<RuntimeError>,
    #[serde(default)]
    pub outputs: HashMap<String, SkillValue>,
}

impl SkillRunResponse {
    pub fn succeeded(replies: Vec<String>, outputs: HashMap<String, SkillValue>) -> Self {
        Self {
            success: true,
            replies,
            errors: Vec::new(),
            outputs,
        }
    }

    pub fn failed(errors: Vec<RuntimeError>) -> Self {
        Self {
            success: false,
            replies: Vec::new(),
            errors,
            outputs: HashMap::new(),
        }
    }

    /// The synthetic envelope for a runner call that timed out.
    ///
    /// Timeouts are terminal: the remote may or may not have executed, so
    /// the dispatcher reports them as a failed run instead of retrying.
    pub fn timed_out(elapsed: Duration) -> Self {
        Self::failed(vec![RuntimeError::from_description(
            "SF0408",
            format!("skill run timed out after {elapsed:?}"),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn parse_splits_legacy_code_parameter() {
        let endpoint = RunnerEndpoint::parse("https://host/path?code=ABC123");
        assert_eq!(endpoint.url, "https://host/path");
        assert_eq!(endpoint.token().unwrap().expose_secret(), "ABC123");
    }

    #[test]
    fn parse_preserves_other_query_parameters() {
        let endpoint = RunnerEndpoint::parse("https://host/run?version=2&code=TOK&mode=fast");
        assert_eq!(endpoint.url, "https://host/run?version=2&mode=fast");
        assert_eq!(endpoint.token().unwrap().expose_secret(), "TOK");
    }

    #[test]
    fn parse_without_query_has_no_token() {
        let endpoint = RunnerEndpoint::parse("https://host/run");
        assert_eq!(endpoint.url, "https://host/run");
        assert!(endpoint.token().is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let endpoint = RunnerEndpoint::parse("https://host/run?code=SECRET");
        let debug = format!("{endpoint:?}");
        assert!(!debug.contains("SECRET"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn request_serializes_name_field() {
        let request = SkillRunRequest::new("greet", "world", "Reply(\"hi\");");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["name"], "greet");
        assert_eq!(json["arguments"], "world");
        assert!(json.get("signal").is_none(), "plain runs omit the signal field");
    }

    #[test]
    fn response_defaults_missing_collections() {
        let response: SkillRunResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(response.success);
        assert!(response.replies.is_empty());
        assert!(response.errors.is_empty());
        assert!(response.outputs.is_empty());
    }

    #[test]
    fn timed_out_is_a_failed_envelope() {
        let response = SkillRunResponse::timed_out(Duration::from_secs(30));
        assert!(!response.success);
        assert!(response.replies.is_empty());
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].description.contains("timed out"));
    }
}
