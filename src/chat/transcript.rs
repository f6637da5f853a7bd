// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation transcript
//!
//! Always starts with the assistant greeting. Messages are only appended;
//! the one exception is `reset`, which goes back to the greeting alone.
//! Positions are stable for the life of the transcript.

use crate::error::{CompanionError, Result};
use crate::llm::message::Message;

/// Ordered, never-empty message history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    greeting: String,
    messages: Vec<Message>,
}

impl Transcript {
    /// Create a transcript seeded with `greeting`
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let messages = vec![Message::assistant(greeting.clone())];
        Self { greeting, messages }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Back to the single greeting
    pub fn reset(&mut self) {
        self.messages.truncate(1);
        self.messages[0] = Message::assistant(self.greeting.clone());
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Drop the reasoning attached to the message at `index`.
    pub fn clear_think(&mut self, index: usize) -> Result<()> {
        let len = self.messages.len();
        let message = self.messages.get_mut(index).ok_or_else(|| {
            CompanionError::InvalidInput(format!(
                "no message at index {} (transcript has {})",
                index, len
            ))
        })?;
        message.think = None;
        Ok(())
    }
}
