// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};
use tokio::sync::mpsc;

use companion::chat::commands::format_models;
use companion::chat::selection::{BackendSelection, CloudModel};
use companion::chat::{ChatEngine, IgnoreReason, SubmitOutcome};
use companion::cli::{AskArgs, OutputFormat, SettingsArgs};
use companion::config::Settings;
use companion::error::{CompanionError, Result};

pub(super) async fn run_ask(args: AskArgs, settings: Settings, format: OutputFormat) -> Result<()> {
    let prompt = match (args.prompt, args.stdin) {
        (_, true) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (Some(prompt), false) => prompt,
        (None, false) => {
            return Err(CompanionError::InvalidInput(
                "provide a prompt or pass --stdin".to_string(),
            ))
        }
    };

    let engine = ChatEngine::from_settings(&settings)?;
    let (message, failed) = match engine.submit(&prompt).await {
        SubmitOutcome::Resolved(message) => (message, false),
        SubmitOutcome::Failed(message) => (message, true),
        SubmitOutcome::Ignored(IgnoreReason::Empty) => {
            return Err(CompanionError::InvalidInput("prompt is empty".to_string()))
        }
        SubmitOutcome::Ignored(IgnoreReason::Busy) => {
            return Err(CompanionError::Session("engine is busy".to_string()))
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&message)?),
        OutputFormat::Text if failed => eprintln!("{}", message.content),
        OutputFormat::Text => println!("{}", message.content),
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

pub(super) fn run_models_command(settings: &Settings, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let models: Vec<serde_json::Value> = CloudModel::all()
                .iter()
                .map(|model| {
                    serde_json::json!({
                        "id": model.id(),
                        "name": model.display_name(),
                        "description": model.description(),
                        "default": *model == settings.backends.cloud.default_model,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&models)?);
        }
        OutputFormat::Text => println!("{}", format_models(settings.backends.cloud.default_model)),
    }
    Ok(())
}

pub(super) fn run_settings_command(
    args: SettingsArgs,
    settings: &Settings,
    path: &Path,
) -> Result<()> {
    if args.path {
        println!("{}", path.display());
    } else {
        println!("{}", settings.redacted_json()?);
    }
    Ok(())
}

/// Print the session banner
pub(super) fn print_welcome(selection: BackendSelection, local_model: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    println!("companion v{}", env!("CARGO_PKG_VERSION"));
    stdout.execute(ResetColor)?;
    let model = if selection.backend.is_streaming() {
        local_model
    } else {
        selection.cloud_model.id()
    };
    println!(
        "Backend: {} ({})",
        selection.backend.display_name(),
        model
    );
    println!("Type /help for commands, exit to quit\n");
    Ok(())
}

pub(super) fn print_prompt() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Green))?;
    print!("you: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;
    Ok(())
}

/// Read stdin lines on their own thread so input still arrives while a
/// reply is streaming. The channel closes at end of input.
pub(super) fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });
    rx
}
