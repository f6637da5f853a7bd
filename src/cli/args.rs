// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::chat::selection::BackendKind;

/// Companion - study chat assistant for your terminal
#[derive(Parser, Debug)]
#[command(name = "companion")]
#[command(version, about = "Study chat assistant backed by a local or cloud model")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend for the first turn (overrides settings)
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Cloud model id (overrides settings)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start interactive chat session (default when no command given)
    Chat,

    /// Ask a single question (non-interactive)
    Ask(AskArgs),

    /// List cloud models
    Models,

    /// Show effective settings
    #[command(alias = "config")]
    Settings(SettingsArgs),
}

/// Arguments for ask command
#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The question to ask
    pub prompt: Option<String>,

    /// Read prompt from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for settings command
#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    /// Print only the settings file path
    #[arg(long)]
    pub path: bool,
}

/// Output format for responses
#[derive(ValueEnum, Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Text,

    /// JSON output
    Json,
}
