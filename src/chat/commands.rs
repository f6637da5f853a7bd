// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Command handling for the chat loop
//!
//! Turns one line of user input into a `ChatCommand` so routing can be
//! tested without a terminal.

use crate::chat::selection::{BackendKind, CloudModel};

/// Parsed chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Plain text to send as a turn
    Message(String),
    /// Reset the transcript
    Clear,
    /// Switch backend
    Backend(BackendKind),
    /// Switch cloud model
    Model(CloudModel),
    /// List cloud models
    Models,
    /// Hide the reasoning pane of the current turn
    HideThink,
    /// Drop the reasoning of a transcript message
    Dismiss(usize),
    /// Print the transcript
    History,
    /// Show help
    Help,
    /// Leave the chat loop
    Exit,
    /// Empty input
    Empty,
    /// Slash command that could not be parsed, with the reason
    Invalid(String),
}

/// Parse user input into a ChatCommand
pub fn parse_command(input: &str) -> ChatCommand {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ChatCommand::Empty;
    }

    if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit") {
        return ChatCommand::Exit;
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return ChatCommand::Message(trimmed.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match (name.to_lowercase().as_str(), arg) {
        ("quit" | "exit", _) => ChatCommand::Exit,
        ("clear", _) => ChatCommand::Clear,
        ("help", _) => ChatCommand::Help,
        ("history", _) => ChatCommand::History,
        ("models", _) => ChatCommand::Models,
        ("hide-think", _) => ChatCommand::HideThink,
        ("backend", "") => ChatCommand::Invalid("usage: /backend <local|cloud>".to_string()),
        ("backend", arg) => match arg.parse() {
            Ok(kind) => ChatCommand::Backend(kind),
            Err(err) => ChatCommand::Invalid(err.to_string()),
        },
        ("model", "") => ChatCommand::Invalid("usage: /model <id>".to_string()),
        ("model", arg) => match arg.parse() {
            Ok(model) => ChatCommand::Model(model),
            Err(err) => ChatCommand::Invalid(err.to_string()),
        },
        ("dismiss", arg) => match arg.parse() {
            Ok(index) => ChatCommand::Dismiss(index),
            Err(_) => ChatCommand::Invalid("usage: /dismiss <message number>".to_string()),
        },
        (other, _) => ChatCommand::Invalid(format!("unknown command '/{}'", other)),
    }
}

pub fn format_help_text() -> String {
    r#"Companion Commands:
  /help              - Show this help message
  /clear             - Start over from the greeting
  /backend <name>    - Switch backend (local, cloud)
  /model <id>        - Switch cloud model
  /models            - List cloud models
  /hide-think        - Hide the reasoning of the current answer
  /dismiss <n>       - Remove the reasoning shown on message n
  /history           - Show the conversation so far
  exit, quit, /quit  - Leave

Anything else is sent as a message."#
        .to_string()
}

/// One line per cloud model, marking the current one
pub fn format_models(current: CloudModel) -> String {
    CloudModel::all()
        .iter()
        .map(|model| {
            let marker = if *model == current { "*" } else { " " };
            format!(
                "{} {:<24} {} - {}",
                marker,
                model.id(),
                model.display_name(),
                model.description()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_message() {
        assert_eq!(
            parse_command("  what is osmosis? "),
            ChatCommand::Message("what is osmosis?".to_string())
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_command(""), ChatCommand::Empty);
        assert_eq!(parse_command("   \t"), ChatCommand::Empty);
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "QUIT", "/quit", "/exit"] {
            assert_eq!(parse_command(input), ChatCommand::Exit);
        }
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("/clear"), ChatCommand::Clear);
        assert_eq!(parse_command("/HELP"), ChatCommand::Help);
        assert_eq!(parse_command("/history"), ChatCommand::History);
        assert_eq!(parse_command("/models"), ChatCommand::Models);
        assert_eq!(parse_command("/hide-think"), ChatCommand::HideThink);
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(
            parse_command("/backend local"),
            ChatCommand::Backend(BackendKind::LocalStreaming)
        );
        assert_eq!(
            parse_command("/backend groq"),
            ChatCommand::Backend(BackendKind::CloudBatch)
        );
        assert!(matches!(parse_command("/backend"), ChatCommand::Invalid(_)));
        assert!(matches!(
            parse_command("/backend mars"),
            ChatCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_parse_model() {
        assert_eq!(
            parse_command("/model llama-3.3-70b-versatile"),
            ChatCommand::Model(CloudModel::Llama33_70bVersatile)
        );
        match parse_command("/model gpt-9") {
            ChatCommand::Invalid(reason) => assert!(reason.contains("llama-3.1-8b-instant")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_dismiss() {
        assert_eq!(parse_command("/dismiss 4"), ChatCommand::Dismiss(4));
        assert!(matches!(parse_command("/dismiss"), ChatCommand::Invalid(_)));
        assert!(matches!(
            parse_command("/dismiss two"),
            ChatCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse_command("/teleport now"),
            ChatCommand::Invalid("unknown command '/teleport'".to_string())
        );
    }

    #[test]
    fn test_help_mentions_every_command() {
        let help = format_help_text();
        for cmd in ["/clear", "/backend", "/model", "/models", "/hide-think", "/dismiss", "/history"] {
            assert!(help.contains(cmd), "help is missing {}", cmd);
        }
    }

    #[test]
    fn test_format_models_marks_current() {
        let listing = format_models(CloudModel::Llama33_70bVersatile);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  llama-3.1-8b-instant"));
        assert!(lines[1].starts_with("* llama-3.3-70b-versatile"));
        assert!(lines[1].contains("More powerful, better reasoning"));
    }
}
