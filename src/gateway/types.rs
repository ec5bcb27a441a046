//! Entities produced by the gateway and consumed by the feature views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Chat messages ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name used in Gemini conversation turns.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "model",
        }
    }
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Citations backing an assistant answer, in backend order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding: Vec<GroundingSource>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), Vec::new())
    }

    pub fn assistant(content: impl Into<String>, grounding: Vec<GroundingSource>) -> Self {
        Self::new(Role::Assistant, content.into(), grounding)
    }

    fn new(role: Role, content: String, grounding: Vec<GroundingSource>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
            grounding,
        }
    }
}

// ── Grounding ────────────────────────────────────────────────────

/// A citation attached to a generated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GroundingSource {
    Web { uri: String, title: String },
    Map { uri: String, title: String },
}

impl GroundingSource {
    pub fn uri(&self) -> &str {
        match self {
            Self::Web { uri, .. } | Self::Map { uri, .. } => uri,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Web { title, .. } | Self::Map { title, .. } => title,
        }
    }
}

/// Free-text answer plus the citations that justify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelAdvice {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

// ── Structured responses ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySuggestion {
    pub title: String,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyAlert {
    pub title: String,
    pub severity: Severity,
    pub desc: String,
}

/// Safety briefing for the area around a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyBundle {
    pub location_name: String,
    /// Free-text classification, normally "Safe", "Caution" or "Alert".
    pub region_status: String,
    pub alerts: Vec<SafetyAlert>,
    pub etiquette: Vec<String>,
}
