// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Cloud batch backend (Groq, OpenAI-compatible chat completions)
//!
//! One request, one JSON response. Sampling parameters are fixed constants
//! of the adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chat::selection::BackendKind;
use crate::error::{BackendError, CompanionError, Result};
use crate::llm::message::{to_wire_messages, Message, WireMessage};
use crate::llm::transport::{ChatTransport, TurnEvent, TurnRequest, TurnStream};
use crate::llm::transports::common::{http_error, map_send_error};

pub const DEFAULT_CLOUD_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1024;

/// Batch adapter for the cloud completion service
pub struct CloudBatchTransport {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CloudBatchTransport {
    /// Create a transport against the default endpoint
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_CLOUD_URL)
    }

    /// Create with a custom endpoint URL
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }

    fn build_request(&self, turn: &TurnRequest) -> CloudChatRequest {
        CloudChatRequest {
            model: turn.selection.cloud_model.id().to_string(),
            messages: to_wire_messages(&turn.messages),
            stream: false,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Extract the assistant message from a completion payload
    fn parse_completion(body: &str) -> Result<Message> {
        let response: CloudChatResponse = serde_json::from_str(body).map_err(|e| {
            CompanionError::Backend(BackendError::Protocol(format!(
                "unparseable completion: {}",
                e
            )))
        })?;

        let message = response
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .ok_or_else(|| {
                CompanionError::Backend(BackendError::Protocol(
                    "completion has no choices[0].message".to_string(),
                ))
            })?;

        let content = message
            .content
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "No response content from {}.",
                    BackendKind::CloudBatch.display_name()
                )
            });

        Ok(Message::assistant(content))
    }
}

#[async_trait]
impl ChatTransport for CloudBatchTransport {
    fn backend(&self) -> BackendKind {
        BackendKind::CloudBatch
    }

    async fn send(&self, turn: TurnRequest) -> Result<TurnStream> {
        let body = self.build_request(&turn);

        tracing::debug!(
            target: "companion.llm.cloud",
            turn_id = %turn.id,
            model = %body.model,
            messages = body.messages.len(),
            "dispatching batch turn"
        );

        let mut request = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_send_error(BackendKind::CloudBatch, e))?;

        if !response.status().is_success() {
            let err = http_error(response).await;
            tracing::debug!(
                target: "companion.llm.cloud",
                turn_id = %turn.id,
                error = %err,
                "batch turn rejected"
            );
            return Err(err);
        }

        let text = response
            .text()
            .await
            .map_err(|e| CompanionError::Backend(BackendError::Stream(e.to_string())))?;
        let message = Self::parse_completion(&text)?;

        let event: Result<TurnEvent> = Ok(TurnEvent::Complete(message));
        Ok(Box::pin(futures::stream::once(async move { event })))
    }
}

// OpenAI-compatible wire types

#[derive(Debug, Serialize)]
struct CloudChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CloudChatResponse {
    #[serde(default)]
    choices: Option<Vec<CloudChoice>>,
}

#[derive(Debug, Deserialize)]
struct CloudChoice {
    #[serde(default)]
    message: Option<CloudChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct CloudChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
