//! HTTP transport for runner endpoints.
//!
//! Sends `POST {endpoint}` with the JSON run request, bearer-authenticated
//! when the endpoint carries a token, and decodes the JSON response
//! envelope. Transport failures are classified by stage so the dispatcher
//! can apply its retry boundary:
//!
//! - connection-level failures (DNS, refused, TLS) -> `Connect`
//! - elapsed request timeout -> `Timeout`
//! - non-2xx status -> `Endpoint` (the remote accepted the call)
//! - undecodable body -> `Protocol`
//!
//! Anything ambiguous is classified as non-retryable: a call that may have
//! reached the remote must not run twice.

use std::time::Duration;

use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use skillforge_core::dispatch::dispatcher::SkillRunner;
use skillforge_types::error::DispatchError;
use skillforge_types::runner::{RunnerEndpoint, SkillRunRequest, SkillRunResponse};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-based [`SkillRunner`].
pub struct HttpSkillRunner {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSkillRunner {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create reqwest client");
        Self { client, timeout }
    }

    fn classify(&self, error: reqwest::Error) -> DispatchError {
        if error.is_timeout() {
            DispatchError::Timeout(self.timeout)
        } else if error.is_connect() {
            DispatchError::Connect(error.to_string())
        } else {
            DispatchError::Protocol(error.to_string())
        }
    }
}

impl Default for HttpSkillRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillRunner for HttpSkillRunner {
    async fn run(
        &self,
        endpoint: &RunnerEndpoint,
        request: &SkillRunRequest,
        cancel: &CancellationToken,
    ) -> Result<SkillRunResponse, DispatchError> {
        let mut builder = self.client.post(&endpoint.url).json(request);
        if let Some(token) = endpoint.token() {
            builder = builder.bearer_auth(token.expose_secret());
        }

        debug!(skill = %request.skill_name, url = %endpoint.url, "dispatching run request");

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
            result = builder.send() => result.map_err(|e| self.classify(e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Endpoint {
                status: status.as_u16(),
            });
        }

        response
            .json::<SkillRunResponse>()
            .await
            .map_err(|e| DispatchError::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancellation_wins_over_send() {
        let runner = HttpSkillRunner::new();
        let endpoint = RunnerEndpoint::new("https://runner.invalid/run", None);
        let request = SkillRunRequest::new("greet", "", "Reply(\"hi\");");

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = runner.run(&endpoint, &request, &cancel).await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_failure() {
        // Port 1 on loopback refuses immediately; no DNS involved.
        let runner = HttpSkillRunner::with_timeout(Duration::from_secs(5));
        let endpoint = RunnerEndpoint::new("http://127.0.0.1:1/run", None);
        let request = SkillRunRequest::new("greet", "", "Reply(\"hi\");");

        let err = runner
            .run(&endpoint, &request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(
            matches!(err, DispatchError::Connect(_)),
            "expected Connect, got: {err:?}"
        );
    }
}
