//! Tracing subscriber initialization with structured logging.
//!
//! # Usage
//!
//! ```no_run
//! // Human-readable output for local development
//! skillforge_observe::tracing_setup::init_tracing(false).unwrap();
//!
//! // JSON output for production log pipelines
//! skillforge_observe::tracing_setup::init_tracing(true).unwrap();
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// - Installs a structured `fmt` layer with target visibility and span
///   close timing.
/// - When `json` is true, events are emitted as JSON lines for log
///   pipelines; otherwise in the human-readable format.
/// - Respects `RUST_LOG` via `EnvFilter::from_default_env()`.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env();

    if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
