//! Observability setup for Skillforge.

pub mod tracing_setup;
