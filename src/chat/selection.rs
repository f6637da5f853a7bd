// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Backend selection
//!
//! Which backend and which cloud model handle the next turn. Plain data; the
//! engine snapshots it when a turn is dispatched.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CompanionError;

/// The two interchangeable chat backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Locally hosted model server, streamed NDJSON responses
    #[value(name = "local", alias = "ollama")]
    LocalStreaming,
    /// Cloud completion service, single JSON response
    #[value(name = "cloud", alias = "groq")]
    CloudBatch,
}

impl BackendKind {
    /// Name shown to the user in messages
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::LocalStreaming => "Ollama",
            BackendKind::CloudBatch => "Groq",
        }
    }

    /// Whether responses arrive incrementally
    pub fn is_streaming(&self) -> bool {
        matches!(self, BackendKind::LocalStreaming)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::LocalStreaming => write!(f, "local-streaming"),
            BackendKind::CloudBatch => write!(f, "cloud-batch"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = CompanionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "local-streaming" | "ollama" => Ok(BackendKind::LocalStreaming),
            "cloud" | "cloud-batch" | "groq" => Ok(BackendKind::CloudBatch),
            other => Err(CompanionError::InvalidInput(format!(
                "unknown backend '{}' (expected 'local' or 'cloud')",
                other
            ))),
        }
    }
}

/// Fixed set of cloud model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CloudModel {
    #[default]
    #[serde(rename = "llama-3.1-8b-instant")]
    Llama31_8bInstant,
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama33_70bVersatile,
}

impl CloudModel {
    /// All selectable variants, in display order
    pub fn all() -> &'static [CloudModel] {
        &[CloudModel::Llama31_8bInstant, CloudModel::Llama33_70bVersatile]
    }

    /// Wire identifier sent to the cloud backend
    pub fn id(&self) -> &'static str {
        match self {
            CloudModel::Llama31_8bInstant => "llama-3.1-8b-instant",
            CloudModel::Llama33_70bVersatile => "llama-3.3-70b-versatile",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CloudModel::Llama31_8bInstant => "Llama 3.1 8B Instant",
            CloudModel::Llama33_70bVersatile => "Llama 3.3 70B Versatile",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CloudModel::Llama31_8bInstant => "Fast responses, good for quick queries",
            CloudModel::Llama33_70bVersatile => "More powerful, better reasoning",
        }
    }
}

impl fmt::Display for CloudModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CloudModel {
    type Err = CompanionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CloudModel::all()
            .iter()
            .copied()
            .find(|m| m.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = CloudModel::all().iter().map(|m| m.id()).collect();
                CompanionError::InvalidInput(format!(
                    "unknown cloud model '{}' (expected one of: {})",
                    wanted,
                    known.join(", ")
                ))
            })
    }
}

/// The user's current choice of backend and cloud model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSelection {
    pub backend: BackendKind,
    pub cloud_model: CloudModel,
}

impl BackendSelection {
    pub fn new(backend: BackendKind, cloud_model: CloudModel) -> Self {
        Self {
            backend,
            cloud_model,
        }
    }

    /// Same cloud model, different backend
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Same backend, different cloud model
    pub fn with_cloud_model(mut self, cloud_model: CloudModel) -> Self {
        self.cloud_model = cloud_model;
        self
    }
}

impl Default for BackendSelection {
    fn default() -> Self {
        Self::new(BackendKind::CloudBatch, CloudModel::default())
    }
}
