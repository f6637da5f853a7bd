// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Companion - study chat assistant for your terminal
//!
//! Entry point for the companion CLI application.

use clap::Parser;

use companion::cli::{Cli, Commands};
use companion::config::Settings;
use companion::error::Result;

#[path = "main/chat_loop.rs"]
mod chat_loop;
#[path = "main/cli_commands.rs"]
mod cli_commands;

use chat_loop::run_chat;
use cli_commands::{run_ask, run_models_command, run_settings_command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on engine and transport diagnostics; `RUST_LOG` still applies.
    if cli.verbose > 0 {
        let mut directives = vec![
            "companion.chat.engine=debug",
            "companion.llm.local=debug",
            "companion.llm.cloud=debug",
            "companion.config=debug",
        ];
        if cli.verbose > 1 {
            directives.push("companion=trace");
        }
        for directive in directives {
            if let Ok(parsed) = directive.parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load_from(&settings_path)?;
    apply_cli_overrides(&mut settings, &cli)?;

    match cli.command {
        None | Some(Commands::Chat) => run_chat(settings).await?,
        Some(Commands::Ask(args)) => run_ask(args, settings, cli.format).await?,
        Some(Commands::Models) => run_models_command(&settings, cli.format)?,
        Some(Commands::Settings(args)) => run_settings_command(args, &settings, &settings_path)?,
    }

    Ok(())
}

fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) -> Result<()> {
    if let Some(backend) = cli.backend {
        settings.session.default_backend = backend;
    }
    if let Some(model) = &cli.model {
        settings.backends.cloud.default_model = model.parse()?;
    }
    Ok(())
}
