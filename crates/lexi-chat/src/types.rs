//! Conversation data model: citations, turns, and backend answers.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// =============================================================================
// Citation
// =============================================================================

/// A quoted excerpt of a source document with locator metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Quoted excerpt.
    pub text: String,
    /// Document identifier, usually a file name.
    pub source: String,
    /// URL of the source document.
    pub link: String,
    /// Locator label inside the document, e.g. "Para 7".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<String>,
}

impl Citation {
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            link: link.into(),
            paragraph: None,
        }
    }

    pub fn with_paragraph(mut self, paragraph: impl Into<String>) -> Self {
        self.paragraph = Some(paragraph.into());
        self
    }

    /// The locator label, ignoring blank values.
    pub fn locator(&self) -> Option<&str> {
        self.paragraph
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

// =============================================================================
// Turn
// =============================================================================

/// Identifier of a turn. Assigned in creation order, so ordering by id is
/// ordering by time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Role-specific payload of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnBody {
    /// A question typed by the user.
    User { content: String },
    /// A synthesized answer with the citations backing it.
    Assistant {
        content: String,
        citations: Vec<Citation>,
    },
    /// Notice that the backend could not answer.
    Error { content: String },
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub created_at: DateTime<Local>,
    #[serde(flatten)]
    pub body: TurnBody,
}

impl Turn {
    pub fn role(&self) -> Role {
        match self.body {
            TurnBody::User { .. } => Role::User,
            TurnBody::Assistant { .. } | TurnBody::Error { .. } => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match &self.body {
            TurnBody::User { content }
            | TurnBody::Assistant { content, .. }
            | TurnBody::Error { content } => content,
        }
    }

    /// Citations attached to the turn. Empty for anything but an answer.
    pub fn citations(&self) -> &[Citation] {
        match &self.body {
            TurnBody::Assistant { citations, .. } => citations,
            _ => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, TurnBody::Error { .. })
    }
}

// =============================================================================
// Answer
// =============================================================================

/// What the answer backend returns for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}
