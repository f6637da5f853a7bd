// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Local streaming backend (Ollama `/api/chat`)
//!
//! Posts the conversation with `stream: true` and decodes the NDJSON body as
//! it arrives. Every token re-runs the think splitter over the full text so
//! far and yields a progress snapshot; the stream finishes when the channel
//! closes, not on a sentinel object.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::chat::selection::BackendKind;
use crate::error::{BackendError, CompanionError, Result};
use crate::llm::message::{to_wire_messages, Message, WireMessage};
use crate::llm::think;
use crate::llm::transport::{ChatTransport, StreamingBuffer, TurnEvent, TurnRequest, TurnStream};
use crate::llm::transports::common::{
    connection_error, describe_send_error, http_error, map_send_error,
};
use crate::llm::transports::ndjson::NdjsonDecoder;

pub const DEFAULT_LOCAL_URL: &str = "http://localhost:11434";
pub const DEFAULT_LOCAL_MODEL: &str = "qwen3:8b";

/// Streaming adapter for a locally hosted model server
pub struct LocalStreamingTransport {
    client: Client,
    base_url: String,
    model: String,
    carry_partial_lines: bool,
}

impl LocalStreamingTransport {
    /// Create a transport against the default local URL and model
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_LOCAL_URL, DEFAULT_LOCAL_MODEL)
    }

    /// Create with a custom base URL and model
    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            carry_partial_lines: false,
        }
    }

    /// Buffer unterminated lines across reads instead of dropping them
    pub fn with_carry_partial_lines(mut self, carry: bool) -> Self {
        self.carry_partial_lines = carry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, turn: &TurnRequest) -> LocalChatRequest {
        LocalChatRequest {
            model: self.model.clone(),
            messages: to_wire_messages(&turn.messages),
            stream: true,
        }
    }
}

impl Default for LocalStreamingTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Running text of a streaming turn and its think-visibility latch
#[derive(Debug, Default)]
pub(crate) struct StreamProgress {
    full_text: String,
    think_visible: bool,
}

impl StreamProgress {
    /// Append a token and return the snapshot to publish
    pub(crate) fn push_token(&mut self, token: &str) -> StreamingBuffer {
        self.full_text.push_str(token);
        let split = think::split(&self.full_text);
        if split.has_think() {
            self.think_visible = true;
        }
        StreamingBuffer {
            visible_text: split.visible,
            think_text: split.think,
            think_visible: self.think_visible,
        }
    }

    /// Final message from everything accumulated
    pub(crate) fn into_message(self) -> Message {
        let split = think::split(&self.full_text);
        Message::assistant_with_think(split.visible, split.think)
    }
}

#[async_trait]
impl ChatTransport for LocalStreamingTransport {
    fn backend(&self) -> BackendKind {
        BackendKind::LocalStreaming
    }

    async fn send(&self, turn: TurnRequest) -> Result<TurnStream> {
        let url = self.chat_url();
        let body = self.build_request(&turn);

        tracing::debug!(
            target: "companion.llm.local",
            turn_id = %turn.id,
            model = %self.model,
            messages = body.messages.len(),
            "dispatching streaming turn"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(BackendKind::LocalStreaming, e))?;

        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let byte_stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| describe_send_error(&e)));

        Ok(decode_events(byte_stream, self.carry_partial_lines, turn.id))
    }
}

/// Turn a chunked NDJSON body into progress events and a final message.
///
/// A read error before the first byte is a connection failure; after that
/// it is a broken stream.
fn decode_events<S, B>(byte_stream: S, carry: bool, turn_id: Uuid) -> TurnStream
where
    S: Stream<Item = std::result::Result<B, String>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let event_stream = async_stream::try_stream! {
        let mut decoder = NdjsonDecoder::new(carry);
        let mut progress = StreamProgress::default();
        let mut bytes_seen: usize = 0;

        for await chunk_result in byte_stream {
            let chunk = chunk_result.map_err(|message| {
                if bytes_seen == 0 {
                    connection_error(BackendKind::LocalStreaming, message)
                } else {
                    CompanionError::Backend(BackendError::Stream(message))
                }
            })?;
            let bytes = chunk.as_ref();
            bytes_seen += bytes.len();

            for token in decoder.feed(bytes) {
                yield TurnEvent::Progress(progress.push_token(&token));
            }
        }

        for token in decoder.finish() {
            yield TurnEvent::Progress(progress.push_token(&token));
        }

        tracing::debug!(
            target: "companion.llm.local",
            turn_id = %turn_id,
            bytes = bytes_seen,
            skipped_lines = decoder.skipped_lines(),
            "stream closed"
        );

        yield TurnEvent::Complete(progress.into_message());
    };

    Box::pin(event_stream)
}

#[derive(Debug, Serialize)]
struct LocalChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}
