// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Companion - chat session engine for a study assistant.
//!
//! This crate exposes the runtime used by the `companion` CLI (`src/main.rs`)
//! and by any UI that embeds the engine.
//!
//! Architecture highlights:
//! - `chat`: session engine, transcript, backend selection, failure texts
//! - `llm`: transport abstraction, the local streaming and cloud batch
//!   adapters, and the think/visible splitter
//! - `config`: JSON settings under `~/.companion`

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;

pub use error::{BackendError, CompanionError, Result};
