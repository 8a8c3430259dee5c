//! Conversation transcript state.
//!
//! The transcript is the sole mutable state of the widget: an ordered,
//! append-only sequence of role-tagged turns. It is owned by the
//! [`ChatController`](crate::controller::ChatController) and only ever
//! reconstructed via reset.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

impl Role {
    /// Lowercase wire/CSS name for the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single exchanged message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the author.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Turn {
    /// Create a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Serializable view of the transcript for the JSON dump endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptDump {
    pub started_at: String, // RFC3339
    pub last_activity: String,
    pub turns: Vec<Turn>,
}

/// Ordered conversation state shared between handlers.
///
/// Clones are cheap handles onto the same underlying turns, mirroring how
/// the server hands one logical transcript to every route.
#[derive(Debug, Clone)]
pub struct Transcript {
    inner: Arc<TranscriptInner>,
}

#[derive(Debug)]
struct TranscriptInner {
    turns: RwLock<Vec<Turn>>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(TranscriptInner {
                turns: RwLock::new(Vec::new()),
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        }
    }

    /// Append a turn.
    pub fn push(&self, turn: Turn) {
        let mut guard = self.inner.turns.write().unwrap();
        guard.push(turn);
        drop(guard);
        self.touch();
    }

    /// Append a user turn.
    pub fn push_user(&self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    /// Snapshot of all turns in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.inner.turns.read().unwrap().clone()
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.turns.read().unwrap().len()
    }

    /// Whether the transcript holds no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every turn. The only way the transcript shrinks.
    pub fn clear(&self) {
        let mut guard = self.inner.turns.write().unwrap();
        guard.clear();
        drop(guard);
        self.touch();
    }

    /// Serializable view for the dump endpoint.
    #[must_use]
    pub fn dump(&self) -> TranscriptDump {
        TranscriptDump {
            started_at: self.inner.created_at.to_rfc3339(),
            last_activity: self.inner.last_activity.read().unwrap().to_rfc3339(),
            turns: self.snapshot(),
        }
    }

    /// Update the last activity timestamp.
    fn touch(&self) {
        let mut guard = self.inner.last_activity.write().unwrap();
        *guard = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.push_user("hello");
        transcript.push_assistant("hi there");
        assert_eq!(transcript.len(), 2);

        let turns = transcript.snapshot();
        assert_eq!(turns[0], Turn::user("hello"));
        assert_eq!(turns[1], Turn::assistant("hi there"));
    }

    #[test]
    fn test_clear_drops_everything() {
        let transcript = Transcript::new();
        transcript.push_user("one");
        transcript.push_user("two");

        transcript.clear();
        assert!(transcript.is_empty());
        assert!(transcript.snapshot().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let transcript = Transcript::new();
        let handle = transcript.clone();

        handle.push_user("shared");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.snapshot()[0].content, "shared");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
