//! Signals: named events skills raise to trigger other skills.
//!
//! Every [`SignalEvent`] carries two layers of provenance:
//!
//! - [`SourceSkill`] -- the skill that raised *this* event; changes at
//!   every hop of a chain.
//! - [`RootSourceSkill`] -- the origin of the whole chain, including how it
//!   was originally triggered; copied unchanged across every hop.
//!
//! The chain itself is unbounded here. Depth and fan-out caps are enforced
//! by the external router, which is why the full root provenance is exposed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Trigger classification
// ---------------------------------------------------------------------------

/// How a pattern was matched against a chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    StartsWith,
    EndsWith,
    Contains,
    RegularExpression,
    ExactMatch,
}

/// The pattern whose match triggered the root of a signal chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchedPattern {
    pub name: String,
    pub pattern: String,
    pub kind: PatternKind,
}

/// What originally started a signal chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "pattern")]
pub enum SignalTrigger {
    /// A chat message addressed the root skill.
    Chat,
    /// An HTTP request hit the root skill's trigger URL.
    HttpRequest,
    /// A UI interaction (button press, form submit).
    Interaction,
    /// A message matched one of the root skill's patterns.
    PatternMatch(MatchedPattern),
}

impl SignalTrigger {
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Chat)
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Self::HttpRequest)
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self, Self::Interaction)
    }

    pub fn is_pattern_match(&self) -> bool {
        matches!(self, Self::PatternMatch(_))
    }

    /// The matched pattern, when the trigger was a pattern match.
    pub fn matched_pattern(&self) -> Option<&MatchedPattern> {
        match self {
            Self::PatternMatch(pattern) => Some(pattern),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// The skill that raised an event: identity, arguments, and mentions.
///
/// `skill_url` is `None` for synthetic `system:`-prefixed sources, which
/// have no editable skill behind them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSkill {
    pub skill_name: String,
    pub skill_url: Option<String>,
    pub arguments: String,
    pub mentions: Vec<String>,
}

impl SourceSkill {
    pub fn new(
        skill_name: impl Into<String>,
        skill_url: impl Into<String>,
        arguments: impl Into<String>,
        mentions: Vec<String>,
    ) -> Self {
        Self {
            skill_name: skill_name.into(),
            skill_url: Some(skill_url.into()),
            arguments: arguments.into(),
            mentions,
        }
    }

    /// A synthetic source for internally generated signals.
    pub fn system(name: &str, arguments: impl Into<String>) -> Self {
        Self {
            skill_name: format!("system:{name}"),
            skill_url: None,
            arguments: arguments.into(),
            mentions: Vec::new(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.skill_name.starts_with("system:")
    }
}

/// The origin of an entire signal chain: the root source plus the
/// classification of the trigger that started it. Immutable across every hop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootSourceSkill {
    #[serde(flatten)]
    pub source: SourceSkill,
    pub trigger: SignalTrigger,
}

impl RootSourceSkill {
    pub fn new(source: SourceSkill, trigger: SignalTrigger) -> Self {
        Self { source, trigger }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A named event raised by a skill, routed to every subscribed handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    pub id: Uuid,
    pub name: String,
    pub arguments: String,
    pub source: SourceSkill,
    pub root_source: RootSourceSkill,
    pub raised_at: DateTime<Utc>,
}

impl SignalEvent {
    /// The first hop of a chain: Source is derived from the root itself.
    pub fn first_hop(
        name: impl Into<String>,
        arguments: impl Into<String>,
        root: RootSourceSkill,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            arguments: arguments.into(),
            source: root.source.clone(),
            root_source: root,
            raised_at: Utc::now(),
        }
    }

    /// A subsequent hop: `source` identifies the raising handler while the
    /// root source is copied unchanged from the previous event.
    pub fn next_hop(
        name: impl Into<String>,
        arguments: impl Into<String>,
        source: SourceSkill,
        previous: &SignalEvent,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            arguments: arguments.into(),
            source,
            root_source: previous.root_source.clone(),
            raised_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> RootSourceSkill {
        RootSourceSkill::new(
            SourceSkill::new("deploy", "https://app.example/skills/deploy", "prod", vec![]),
            SignalTrigger::PatternMatch(MatchedPattern {
                name: "deploy-request".into(),
                pattern: "^deploy".into(),
                kind: PatternKind::RegularExpression,
            }),
        )
    }

    #[test]
    fn first_hop_source_mirrors_root() {
        let event = SignalEvent::first_hop("deploy:started", "prod", root());
        assert_eq!(event.source, event.root_source.source);
        assert!(event.root_source.trigger.is_pattern_match());
    }

    #[test]
    fn next_hop_keeps_root_source_unchanged() {
        let first = SignalEvent::first_hop("deploy:started", "prod", root());
        let handler = SourceSkill::new("notify", "https://app.example/skills/notify", "prod", vec![]);
        let second = SignalEvent::next_hop("notify:sent", "ok", handler.clone(), &first);

        assert_eq!(second.root_source, first.root_source);
        assert_eq!(second.source, handler);
        assert_ne!(second.source, second.root_source.source);
    }

    #[test]
    fn system_source_has_no_url() {
        let source = SourceSkill::system("cron", "0 9 * * *");
        assert_eq!(source.skill_name, "system:cron");
        assert!(source.skill_url.is_none());
        assert!(source.is_system());
    }

    #[test]
    fn matched_pattern_accessor() {
        let trigger = SignalTrigger::Chat;
        assert!(trigger.matched_pattern().is_none());
        assert!(trigger.is_chat());

        let root = root();
        let pattern = root.trigger.matched_pattern().unwrap();
        assert_eq!(pattern.name, "deploy-request");
    }
}
