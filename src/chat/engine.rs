// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session engine.
//!
//! Owns the transcript, the backend selection and the state of the in-flight
//! turn. Each turn moves `Idle -> Sending -> (Streaming)* -> Idle`; at most
//! one turn is in flight. Observers read state through the getters or
//! subscribe to published `SessionSnapshot`s.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use uuid::Uuid;

use crate::chat::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::chat::failure;
use crate::chat::selection::BackendSelection;
use crate::chat::transcript::Transcript;
use crate::config::Settings;
use crate::error::{BackendError, CompanionError, Result};
use crate::llm::factory::TransportSet;
use crate::llm::message::Message;
use crate::llm::transport::{StreamingBuffer, TurnEvent, TurnRequest};

const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);

/// Where the engine is in the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// Ready for a new submit
    #[default]
    Idle,
    /// Dispatched, nothing received yet
    Sending,
    /// Receiving progress from a streaming backend
    Streaming,
}

/// Everything a UI renders from
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub transcript: Vec<Message>,
    pub streaming: StreamingBuffer,
    pub phase: TurnPhase,
    pub selection: BackendSelection,
}

impl SessionSnapshot {
    pub fn is_busy(&self) -> bool {
        self.phase != TurnPhase::Idle
    }
}

/// Why a submit did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Text was empty or whitespace only
    Empty,
    /// A turn is already in flight
    Busy,
}

/// Result of `ChatEngine::submit`
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend answered; this message was appended
    Resolved(Message),
    /// The turn failed; this explanation was appended
    Failed(Message),
    /// Nothing was appended or sent
    Ignored(IgnoreReason),
}

struct EngineState {
    transcript: Transcript,
    streaming: StreamingBuffer,
    phase: TurnPhase,
    selection: BackendSelection,
    // Set by hide_streaming_think; cleared when the next turn starts.
    think_hidden: bool,
}

impl EngineState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            transcript: self.transcript.messages().to_vec(),
            streaming: self.streaming.clone(),
            phase: self.phase,
            selection: self.selection,
        }
    }
}

/// Returns the engine to `Idle` when a submit is dropped before its turn
/// resolves (timeout around the call, a lost `select!` branch, an aborted task).
struct TurnGuard<'a> {
    engine: &'a ChatEngine,
    turn_id: Uuid,
    armed: bool,
}

impl<'a> TurnGuard<'a> {
    fn new(engine: &'a ChatEngine, turn_id: Uuid) -> Self {
        Self {
            engine,
            turn_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.engine.lock_state();
        state.streaming = StreamingBuffer::default();
        state.phase = TurnPhase::Idle;
        self.engine.publish(&state);
        tracing::warn!(
            target: "companion.chat.engine",
            turn_id = %self.turn_id,
            "turn abandoned before resolving"
        );
    }
}

/// The chat session engine
pub struct ChatEngine {
    state: Mutex<EngineState>,
    snapshots: watch::Sender<SessionSnapshot>,
    transports: TransportSet,
    diagnostics: Arc<dyn DiagnosticsSink>,
    turn_timeout: Option<Duration>,
}

impl ChatEngine {
    pub fn new(
        transports: TransportSet,
        greeting: impl Into<String>,
        selection: BackendSelection,
    ) -> Self {
        let state = EngineState {
            transcript: Transcript::new(greeting),
            streaming: StreamingBuffer::default(),
            phase: TurnPhase::Idle,
            selection,
            think_hidden: false,
        };
        let (snapshots, _) = watch::channel(state.snapshot());

        Self {
            state: Mutex::new(state),
            snapshots,
            transports,
            diagnostics: Arc::new(TracingDiagnostics),
            turn_timeout: Some(DEFAULT_TURN_TIMEOUT),
        }
    }

    /// Build an engine with real transports from validated settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let timeout = match settings.session.turn_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(Self::new(
            TransportSet::from_settings(settings),
            settings.session.greeting.clone(),
            settings.initial_selection(),
        )
        .with_turn_timeout(timeout))
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Limit on each wait for the backend; `None` waits forever
    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Send a user message and resolve the turn.
    ///
    /// Blank text and submits while a turn is in flight are ignored. The
    /// backend selection is captured together with the transition out of
    /// `Idle`, so switching backends afterwards only affects the next turn.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(target: "companion.chat.engine", "ignoring blank submit");
            return SubmitOutcome::Ignored(IgnoreReason::Empty);
        }

        let turn = {
            let mut state = self.lock_state();
            if state.phase != TurnPhase::Idle {
                tracing::debug!(
                    target: "companion.chat.engine",
                    phase = ?state.phase,
                    "ignoring submit while a turn is in flight"
                );
                return SubmitOutcome::Ignored(IgnoreReason::Busy);
            }
            state.transcript.append(Message::user(text));
            state.phase = TurnPhase::Sending;
            state.streaming = StreamingBuffer::default();
            state.think_hidden = false;
            let turn = TurnRequest::new(state.transcript.messages().to_vec(), state.selection);
            self.publish(&state);
            turn
        };

        let backend = turn.backend();
        let turn_id = turn.id;
        tracing::info!(
            target: "companion.chat.engine",
            turn_id = %turn_id,
            backend = %backend,
            messages = turn.messages.len(),
            "dispatching turn"
        );

        let guard = TurnGuard::new(self, turn_id);
        let result = self.run_turn(turn).await;
        guard.disarm();

        let mut state = self.lock_state();
        let outcome = match result {
            Ok(message) => {
                tracing::info!(
                    target: "companion.chat.engine",
                    turn_id = %turn_id,
                    chars = message.content.len(),
                    think = message.has_think(),
                    "turn resolved"
                );
                state.transcript.append(message.clone());
                SubmitOutcome::Resolved(message)
            }
            Err(err) => {
                self.diagnostics.report(backend, turn_id, &err);
                let message = Message::assistant(failure::user_facing_message(backend, &err));
                state.transcript.append(message.clone());
                SubmitOutcome::Failed(message)
            }
        };
        state.streaming = StreamingBuffer::default();
        state.phase = TurnPhase::Idle;
        self.publish(&state);
        outcome
    }

    async fn run_turn(&self, turn: TurnRequest) -> Result<Message> {
        let transport = self.transports.for_backend(turn.backend());
        let mut stream = self.within_timeout(transport.send(turn)).await??;

        loop {
            match self.within_timeout(stream.next()).await? {
                Some(Ok(TurnEvent::Progress(buffer))) => self.publish_progress(buffer),
                Some(Ok(TurnEvent::Complete(message))) => return Ok(message),
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(CompanionError::Backend(BackendError::Protocol(
                        "stream ended without a final message".to_string(),
                    )))
                }
            }
        }
    }

    async fn within_timeout<F: Future>(&self, future: F) -> Result<F::Output> {
        match self.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, future).await.map_err(|_| {
                CompanionError::Backend(BackendError::Timeout {
                    seconds: limit.as_secs(),
                })
            }),
            None => Ok(future.await),
        }
    }

    fn publish_progress(&self, mut buffer: StreamingBuffer) {
        let mut state = self.lock_state();
        if state.think_hidden {
            buffer.think_visible = false;
        }
        state.streaming = buffer;
        state.phase = TurnPhase::Streaming;
        self.publish(&state);
    }

    /// Reset the transcript to the greeting. Fails while a turn is in flight.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.phase != TurnPhase::Idle {
            return Err(CompanionError::Session(
                "cannot clear the transcript while a turn is in flight".to_string(),
            ));
        }
        state.transcript.reset();
        self.publish(&state);
        tracing::debug!(target: "companion.chat.engine", "transcript cleared");
        Ok(())
    }

    /// Change the backend selection. Always allowed; an in-flight turn keeps
    /// the selection it was dispatched with.
    pub fn switch_backend(&self, selection: BackendSelection) {
        let mut state = self.lock_state();
        state.selection = selection;
        self.publish(&state);
        tracing::info!(
            target: "companion.chat.engine",
            backend = %selection.backend,
            cloud_model = %selection.cloud_model,
            "backend selection changed"
        );
    }

    /// Hide the reasoning pane of the in-flight turn for the rest of that turn
    pub fn hide_streaming_think(&self) {
        let mut state = self.lock_state();
        state.think_hidden = true;
        state.streaming.think_visible = false;
        self.publish(&state);
    }

    /// Drop the reasoning attached to a transcript message
    pub fn dismiss_think(&self, index: usize) -> Result<()> {
        let mut state = self.lock_state();
        state.transcript.clear_think(index)?;
        self.publish(&state);
        Ok(())
    }

    pub fn selection(&self) -> BackendSelection {
        self.lock_state().selection
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock_state().transcript.messages().to_vec()
    }

    pub fn streaming_buffer(&self) -> StreamingBuffer {
        self.lock_state().streaming.clone()
    }

    pub fn phase(&self) -> TurnPhase {
        self.lock_state().phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != TurnPhase::Idle
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().snapshot()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    fn publish(&self, state: &EngineState) {
        self.snapshots.send_replace(state.snapshot());
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(
                    target: "companion.chat.engine",
                    "Engine state lock was poisoned, recovering"
                );
                poisoned.into_inner()
            }
        }
    }
}
