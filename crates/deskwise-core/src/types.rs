//! Domain types shared across the Deskwise crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller role. Entries are scoped to one or both roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Enterprise,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Enterprise => "enterprise",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::DeskwiseError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "enterprise" => Ok(Role::Enterprise),
            other => Err(crate::error::DeskwiseError::Validation(format!(
                "Unknown role: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One curated Q&A entry. Immutable after load; the whole set is replaced
/// on reload, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    /// Pattern variants, in declaration order (order breaks rule-match ties).
    pub patterns: Vec<String>,
    /// The canonical phrasing, shown back in logs and the admin surface.
    #[serde(rename = "question")]
    pub canonical_question: String,
    pub answer: String,
    #[serde(default)]
    pub category: String,
    /// Roles allowed to see this entry.
    #[serde(default = "all_roles", rename = "roles")]
    pub role_scope: Vec<Role>,
    /// Optional precomputed vector; entries without one are encoded at
    /// index-build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

fn all_roles() -> Vec<Role> {
    vec![Role::Admin, Role::Enterprise]
}

impl KnowledgeEntry {
    pub fn allows(&self, role: Role) -> bool {
        self.role_scope.contains(&role)
    }

    /// Text fed to the embedder: canonical question plus pattern variants.
    pub fn indexable_text(&self) -> String {
        let mut text = self.canonical_question.clone();
        for p in &self.patterns {
            text.push(' ');
            text.push_str(p);
        }
        text
    }
}

/// Which tier produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchApproach {
    Rule,
    Embedding,
    Fallback,
    None,
    Error,
}

impl MatchApproach {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchApproach::Rule => "rule",
            MatchApproach::Embedding => "embedding",
            MatchApproach::Fallback => "fallback",
            MatchApproach::None => "none",
            MatchApproach::Error => "error",
        }
    }
}

impl std::fmt::Display for MatchApproach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running a question through the matching tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub answer: String,
    pub approach: MatchApproach,
    /// Certainty in [0, 1]. 1.0 for an exact rule match.
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Final answer handed to the gateway/CLI, with timing and cache info.
#[derive(Debug, Clone, Serialize)]
pub struct EngineAnswer {
    pub answer: String,
    pub approach: MatchApproach,
    pub confidence: f32,
    pub response_time_ms: u64,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Who spoke in a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn of a conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<MatchApproach>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            approach: None,
            confidence: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        approach: MatchApproach,
        confidence: f32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            approach: Some(approach),
            confidence: Some(confidence),
        }
    }
}

/// Process-wide matching mode. Monotonic `Primary → Fallback` at runtime;
/// only an explicit reload can restore `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    Uninitialized,
    Primary,
    Fallback,
    Failed,
}

impl ServiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMode::Uninitialized => "uninitialized",
            ServiceMode::Primary => "primary",
            ServiceMode::Fallback => "fallback",
            ServiceMode::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Enterprise ".parse::<Role>().unwrap(), Role::Enterprise);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn entry_role_scope_defaults_to_both() {
        let entry: KnowledgeEntry = serde_json::from_str(
            r#"{"id":"x","patterns":["a"],"question":"a","answer":"b"}"#,
        )
        .unwrap();
        assert!(entry.allows(Role::Admin));
        assert!(entry.allows(Role::Enterprise));
    }

    #[test]
    fn approach_serializes_lowercase() {
        let json = serde_json::to_string(&MatchApproach::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
    }
}
