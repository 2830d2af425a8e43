//! Conversation data model: roles, turns, and per-author histories.

use serde::{Deserialize, Serialize};

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt seeding the conversation
    System,
    /// Incoming user message
    User,
    /// Bot reply
    Assistant,
}

impl Role {
    /// String form used on the completion wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Message role (system/user/assistant)
    pub role: Role,
    /// Message content
    pub content: String,
}

impl Turn {
    /// Create a new turn.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered, append-only history for a single author.
///
/// Created with exactly one system turn; user and assistant turns are
/// appended by the routing engine. History lives for the process lifetime
/// only and grows without bound, a documented scaling limit.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create a conversation seeded with a system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::new(Role::System, system_prompt)],
        }
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(Role::User, content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(Role::Assistant, content));
    }

    /// Full ordered turn sequence.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Role of the most recent turn.
    pub fn last_role(&self) -> Role {
        // A conversation is never empty: it is born with a system turn.
        self.turns.last().map_or(Role::System, |t| t.role)
    }
}
