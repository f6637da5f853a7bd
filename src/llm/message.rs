// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Message types for backend conversations

use serde::{Deserialize, Serialize};

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant response
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Visible text
    pub content: String,

    /// Reasoning segment emitted by the backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub think: Option<String>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            think: None,
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            think: None,
        }
    }

    /// Create an assistant message with a reasoning segment.
    /// An empty segment is stored as absent.
    pub fn assistant_with_think(content: impl Into<String>, think: impl Into<String>) -> Self {
        let think = think.into();
        Self {
            role: Role::Assistant,
            content: content.into(),
            think: if think.is_empty() { None } else { Some(think) },
        }
    }

    /// Whether a reasoning segment is attached
    pub fn has_think(&self) -> bool {
        self.think.is_some()
    }
}

/// `{role, content}` pair as sent on the wire; reasoning is never echoed back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

/// Convert a transcript slice into wire messages
pub fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages.iter().map(WireMessage::from).collect()
}
