//! Organization identity.
//!
//! Every cache namespace, endpoint override, and signal subscription is
//! scoped to an organization: the chat platform plus the platform's own
//! identifier for the tenant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The chat platform an organization lives on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChatPlatform {
    Slack,
    Discord,
    Teams,
}

impl fmt::Display for ChatPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slack => write!(f, "slack"),
            Self::Discord => write!(f, "discord"),
            Self::Teams => write!(f, "teams"),
        }
    }
}

/// Identifies a tenant organization: platform type plus platform id.
///
/// Immutable and hashable. Used as the namespace for artifact caches,
/// endpoint overrides, and signal subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OrganizationIdentifier {
    pub platform: ChatPlatform,
    pub platform_id: String,
}

impl OrganizationIdentifier {
    pub fn new(platform: ChatPlatform, platform_id: impl Into<String>) -> Self {
        Self {
            platform,
            platform_id: platform_id.into(),
        }
    }

    /// A key-safe segment for storage backends.
    ///
    /// Lowercases the platform id and maps anything outside `[a-z0-9]` to
    /// `-`, so the result is valid both as a directory name and as an
    /// object-key prefix.
    pub fn storage_prefix(&self) -> String {
        let id: String = self
            .platform_id
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!("{}-{}", self.platform, id)
    }
}

impl fmt::Display for OrganizationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.platform_id)
    }
}
