//! Shared domain types for Skillforge.
//!
//! This crate contains the core domain types used across the Skillforge
//! subsystem: organizations, skills, cache keys, runner endpoints, signals,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, secrecy,
//! thiserror.

pub mod error;
pub mod org;
pub mod runner;
pub mod signal;
pub mod skill;
pub mod value;
