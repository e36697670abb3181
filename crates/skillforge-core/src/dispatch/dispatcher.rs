//! The execution dispatcher: one runner call, normalized into the uniform
//! response envelope, with transparent retry only where that is safe.
//!
//! The retry boundary is the heart of this module. A failure before any
//! remote code executed (connection refused, DNS, TLS) retries per policy.
//! A received response -- even HTTP 200 with `success: false` -- is final:
//! the remote skill may already have replied in chat or called external
//! APIs. Timeouts are terminal and come back as a failed envelope with a
//! synthetic runtime error.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use skillforge_types::error::DispatchError;
use skillforge_types::runner::{RunnerEndpoint, SkillRunRequest, SkillRunResponse};

use super::retry::RetryPolicy;

/// Transport trait for executing a run request against an endpoint.
///
/// Implementations live in skillforge-infra (`HttpSkillRunner`); tests use
/// scripted fakes.
pub trait SkillRunner: Send + Sync {
    fn run(
        &self,
        endpoint: &RunnerEndpoint,
        request: &SkillRunRequest,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<SkillRunResponse, DispatchError>> + Send;
}

/// Dispatches run requests through a transport with a retry policy.
pub struct ExecutionDispatcher<R, P> {
    runner: R,
    policy: P,
}

impl<R, P> ExecutionDispatcher<R, P>
where
    R: SkillRunner,
    P: RetryPolicy,
{
    pub fn new(runner: R, policy: P) -> Self {
        Self { runner, policy }
    }

    /// Send the request, retrying only pre-execution failures.
    ///
    /// - A response envelope is returned as-is, never retried.
    /// - A timeout becomes a failed envelope with a synthetic runtime
    ///   error; it is not retried past the attempt that produced it.
    /// - Connection-stage failures retry per the policy; once the budget
    ///   is exhausted the error surfaces to the caller.
    pub async fn dispatch(
        &self,
        endpoint: &RunnerEndpoint,
        request: &SkillRunRequest,
        cancel: &CancellationToken,
    ) -> Result<SkillRunResponse, DispatchError> {
        let mut attempt: u32 = 0;

        loop {
            match self.runner.run(endpoint, request, cancel).await {
                Ok(response) => {
                    debug!(
                        skill = %request.skill_name,
                        success = response.success,
                        replies = response.replies.len(),
                        "runner responded"
                    );
                    return Ok(response);
                }
                Err(DispatchError::Timeout(elapsed)) => {
                    warn!(skill = %request.skill_name, ?elapsed, "runner call timed out");
                    return Ok(SkillRunResponse::timed_out(elapsed));
                }
                Err(error) => {
                    attempt += 1;
                    let Some(delay) = self.policy.next_delay(attempt, &error) else {
                        return Err(error);
                    };
                    warn!(
                        skill = %request.skill_name,
                        attempt,
                        ?delay,
                        %error,
                        "retrying after pre-execution failure"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
