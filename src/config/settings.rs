// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for the companion
//!
//! Handles loading settings from ~/.companion/settings.json

use serde::{Deserialize, Serialize};

use crate::chat::selection::{BackendKind, BackendSelection, CloudModel};
use crate::llm::transports::cloud::DEFAULT_CLOUD_URL;
use crate::llm::transports::local::{DEFAULT_LOCAL_MODEL, DEFAULT_LOCAL_URL};

mod io;
mod validation;

/// Greeting the transcript is seeded with
pub const DEFAULT_GREETING: &str =
    "Hi! I am your Study Companion AI. Ask me anything about your studies!";

/// Main settings structure, stored in ~/.companion/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Backend configurations
    #[serde(default)]
    pub backends: BackendsConfig,

    /// Session engine settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Configuration for both backends
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendsConfig {
    /// Locally hosted streaming model server
    #[serde(default)]
    pub local: LocalBackendConfig,

    /// Cloud batch completion service
    #[serde(default)]
    pub cloud: CloudBackendConfig,
}

/// Local streaming backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBackendConfig {
    /// Server base URL (the chat path is appended)
    #[serde(default = "default_local_url")]
    pub base_url: String,

    /// Model name passed through to the server
    #[serde(default = "default_local_model")]
    pub model: String,

    /// Buffer unterminated NDJSON lines across reads instead of dropping them
    #[serde(default)]
    pub carry_partial_lines: bool,
}

/// Cloud batch backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudBackendConfig {
    /// Chat completions endpoint
    #[serde(default = "default_cloud_url")]
    pub base_url: String,

    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_cloud_api_key_env")]
    pub api_key_env: String,

    /// Model selected when a session starts
    #[serde(default)]
    pub default_model: CloudModel,
}

/// Session engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend selected when a session starts
    #[serde(default = "default_backend")]
    pub default_backend: BackendKind,

    /// First assistant message of every transcript
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Seconds to wait for the backend before failing a turn (0 disables)
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_local_url(),
            model: default_local_model(),
            carry_partial_lines: false,
        }
    }
}

impl Default for CloudBackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_cloud_url(),
            api_key: None,
            api_key_env: default_cloud_api_key_env(),
            default_model: CloudModel::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            greeting: default_greeting(),
            turn_timeout_secs: default_turn_timeout_secs(),
        }
    }
}

impl Settings {
    /// Selection a fresh session starts with
    pub fn initial_selection(&self) -> BackendSelection {
        BackendSelection::new(
            self.session.default_backend,
            self.backends.cloud.default_model,
        )
    }
}

fn default_local_url() -> String {
    DEFAULT_LOCAL_URL.to_string()
}

fn default_local_model() -> String {
    DEFAULT_LOCAL_MODEL.to_string()
}

fn default_cloud_url() -> String {
    DEFAULT_CLOUD_URL.to_string()
}

fn default_cloud_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_backend() -> BackendKind {
    BackendKind::CloudBatch
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_turn_timeout_secs() -> u64 {
    120
}
