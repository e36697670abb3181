//! Execution dispatch: sends run requests to runner endpoints with a
//! retry-safe failure policy.

pub mod dispatcher;
pub mod retry;

pub use dispatcher::{ExecutionDispatcher, SkillRunner};
pub use retry::{FixedDelayRetry, RetryPolicy};
