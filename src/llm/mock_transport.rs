// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock transport for testing
//!
//! A scripted `ChatTransport` that replays canned outcomes and records every
//! turn it receives, so engine behaviour can be tested without a server.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::chat::selection::BackendKind;
use crate::error::{BackendError, CompanionError, Result};
use crate::llm::message::Message;
use crate::llm::transport::{ChatTransport, TurnEvent, TurnRequest, TurnStream};
use crate::llm::transports::local::StreamProgress;

/// A canned outcome for one turn
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Emit these tokens as progress (streaming backends only), then complete
    Tokens(Vec<String>),
    /// Complete immediately with this message
    Reply(Message),
    /// Fail at dispatch with an HTTP status
    HttpStatus(u16, String),
    /// Fail at dispatch as unreachable
    ConnectionRefused,
    /// Fail at dispatch with an unexpected payload
    Malformed,
    /// Emit these tokens as progress, then never complete
    Partial(Vec<String>),
    /// Accept the request and never produce an event
    Hang,
}

/// A mock backend transport
#[derive(Clone)]
pub struct MockTransport {
    backend: BackendKind,
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    recorded: Arc<Mutex<Vec<TurnRequest>>>,
    call_count: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    /// Create a mock for the given backend that replies "mock reply"
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            recorded: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// Queue an outcome; outcomes are consumed in order
    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        lock(&self.outcomes).push_back(outcome);
        self
    }

    /// Hold every dispatch until the gate is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of turns dispatched to this transport
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Turns received so far
    pub fn recorded_turns(&self) -> Vec<TurnRequest> {
        lock(&self.recorded).clone()
    }

    fn next_outcome(&self) -> MockOutcome {
        lock(&self.outcomes)
            .pop_front()
            .unwrap_or_else(|| MockOutcome::Reply(Message::assistant("mock reply")))
    }

    fn tokens_to_events(&self, tokens: Vec<String>, complete: bool) -> Vec<Result<TurnEvent>> {
        let mut events = Vec::new();
        let mut progress = StreamProgress::default();
        for token in tokens {
            let buffer = progress.push_token(&token);
            if self.backend.is_streaming() {
                events.push(Ok(TurnEvent::Progress(buffer)));
            }
        }
        if complete {
            events.push(Ok(TurnEvent::Complete(progress.into_message())));
        }
        events
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock transport lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    async fn send(&self, turn: TurnRequest) -> Result<TurnStream> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.recorded).push(turn);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.next_outcome() {
            MockOutcome::Tokens(tokens) => {
                Ok(Box::pin(stream::iter(self.tokens_to_events(tokens, true))))
            }
            MockOutcome::Partial(tokens) => {
                let events = stream::iter(self.tokens_to_events(tokens, false));
                Ok(Box::pin(events.chain(stream::pending())))
            }
            MockOutcome::Reply(message) => {
                let events: Vec<Result<TurnEvent>> = vec![Ok(TurnEvent::Complete(message))];
                Ok(Box::pin(stream::iter(events)))
            }
            MockOutcome::HttpStatus(status, body) => {
                Err(CompanionError::Backend(BackendError::Http { status, body }))
            }
            MockOutcome::ConnectionRefused => {
                Err(CompanionError::Backend(BackendError::Connection {
                    backend: self.backend.display_name().to_string(),
                    message: "connection refused".to_string(),
                }))
            }
            MockOutcome::Malformed => Err(CompanionError::Backend(BackendError::Protocol(
                "mock payload".to_string(),
            ))),
            MockOutcome::Hang => Ok(Box::pin(stream::pending::<Result<TurnEvent>>())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::selection::BackendSelection;

    fn turn() -> TurnRequest {
        TurnRequest::new(vec![Message::user("hi")], BackendSelection::default())
    }

    #[tokio::test]
    async fn test_default_reply() {
        let mock = MockTransport::new(BackendKind::CloudBatch);
        let events: Vec<_> = mock.send(turn()).await.unwrap().collect().await;

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].as_ref().unwrap(),
            &TurnEvent::Complete(Message::assistant("mock reply"))
        );
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.recorded_turns().len(), 1);
    }

    #[tokio::test]
    async fn test_streaming_tokens_produce_progress() {
        let mock = MockTransport::new(BackendKind::LocalStreaming).with_outcome(
            MockOutcome::Tokens(vec!["Hel".to_string(), "lo".to_string()]),
        );
        let events: Vec<_> = mock.send(turn()).await.unwrap().collect().await;

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2].as_ref().unwrap(),
            &TurnEvent::Complete(Message::assistant("Hello"))
        );
    }

    #[tokio::test]
    async fn test_batch_tokens_skip_progress() {
        let mock = MockTransport::new(BackendKind::CloudBatch)
            .with_outcome(MockOutcome::Tokens(vec!["a".to_string(), "b".to_string()]));
        let events: Vec<_> = mock.send(turn()).await.unwrap().collect().await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_emits_progress_without_completing() {
        let mock = MockTransport::new(BackendKind::LocalStreaming)
            .with_outcome(MockOutcome::Partial(vec!["a".to_string()]));
        let mut events = mock.send(turn()).await.unwrap();

        let first = events.next().await.unwrap().unwrap();
        assert!(matches!(first, TurnEvent::Progress(_)));
        let next = tokio::time::timeout(std::time::Duration::from_millis(20), events.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn test_outcomes_consumed_in_order() {
        let mock = MockTransport::new(BackendKind::CloudBatch)
            .with_outcome(MockOutcome::HttpStatus(500, "boom".to_string()))
            .with_outcome(MockOutcome::Reply(Message::assistant("second")));

        assert!(mock.send(turn()).await.is_err());
        assert!(mock.send(turn()).await.is_ok());
        assert_eq!(mock.call_count(), 2);
    }
}
