//! Runner transport implementations.

pub mod http;

pub use http::HttpSkillRunner;
