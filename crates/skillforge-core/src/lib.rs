//! Business logic and port trait definitions for Skillforge.
//!
//! This crate defines the "ports" (cache backends, compiler, runner
//! transport, override store, subscription directory) that the
//! infrastructure layer implements. It depends only on `skillforge-types`
//! -- never on `skillforge-infra` or any network/filesystem crate.

pub mod cache;
pub mod compile;
pub mod dispatch;
pub mod endpoint;
pub mod signal;
