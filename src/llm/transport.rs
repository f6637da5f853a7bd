// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Transport trait and turn types
//!
//! Every backend is driven the same way: the engine hands over a frozen
//! `TurnRequest` and consumes a stream of `TurnEvent`s ending in exactly one
//! `Complete`.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::chat::selection::{BackendKind, BackendSelection};
use crate::error::Result;
use crate::llm::message::Message;

/// Stream of events for one turn
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnEvent>> + Send>>;

/// A backend adapter
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Which backend this adapter talks to
    fn backend(&self) -> BackendKind;

    /// Dispatch a turn. Resolves once the backend has accepted the request;
    /// the returned stream carries progress and the final message.
    async fn send(&self, turn: TurnRequest) -> Result<TurnStream>;
}

/// One dispatched turn. Built once at submit time and never mutated, so a
/// backend switch after dispatch cannot affect it.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Identifier used for log correlation
    pub id: Uuid,

    /// Transcript snapshot, including the new user message
    pub messages: Vec<Message>,

    /// Backend selection at dispatch time
    pub selection: BackendSelection,
}

impl TurnRequest {
    pub fn new(messages: Vec<Message>, selection: BackendSelection) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages,
            selection,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.selection.backend
    }
}

/// Transient state of an in-flight streaming turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingBuffer {
    /// Visible answer so far
    pub visible_text: String,
    /// Reasoning so far (only once its closing marker arrived)
    pub think_text: String,
    /// Whether the reasoning pane is shown
    pub think_visible: bool,
}

impl StreamingBuffer {
    pub fn is_empty(&self) -> bool {
        self.visible_text.is_empty() && self.think_text.is_empty()
    }
}

/// Event produced while a turn is being resolved
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// Partial streaming state, in decode order
    Progress(StreamingBuffer),
    /// Final assistant message; always the last event
    Complete(Message),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::selection::CloudModel;

    #[test]
    fn test_turn_request_new_assigns_unique_ids() {
        let selection = BackendSelection::default();
        let a = TurnRequest::new(vec![Message::user("hi")], selection);
        let b = TurnRequest::new(vec![Message::user("hi")], selection);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_turn_request_backend_comes_from_selection() {
        let selection = BackendSelection::new(BackendKind::LocalStreaming, CloudModel::default());
        let turn = TurnRequest::new(vec![], selection);
        assert_eq!(turn.backend(), BackendKind::LocalStreaming);
    }

    #[test]
    fn test_streaming_buffer_default_is_empty() {
        let buffer = StreamingBuffer::default();
        assert!(buffer.is_empty());
        assert!(!buffer.think_visible);
    }
}
