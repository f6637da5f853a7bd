// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};
use tokio::sync::mpsc;

use companion::chat::commands::{format_help_text, format_models, parse_command, ChatCommand};
use companion::chat::{ChatEngine, SubmitOutcome};
use companion::config::Settings;
use companion::error::{CompanionError, Result};
use companion::llm::message::{Message, Role};
use companion::llm::transport::StreamingBuffer;

use super::cli_commands::{print_prompt, print_welcome, spawn_input_reader};

pub(super) async fn run_chat(settings: Settings) -> Result<()> {
    let engine = Arc::new(ChatEngine::from_settings(&settings)?);
    print_welcome(engine.selection(), &settings.backends.local.model)?;
    print_message(&engine.transcript()[0])?;

    let mut input = spawn_input_reader();
    loop {
        print_prompt()?;
        let Some(line) = input.recv().await else {
            break;
        };

        match parse_command(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => break,
            ChatCommand::Help => println!("{}\n", format_help_text()),
            ChatCommand::Clear => {
                engine.clear()?;
                println!("Conversation cleared.\n");
                print_message(&engine.transcript()[0])?;
            }
            ChatCommand::Backend(kind) => {
                engine.switch_backend(engine.selection().with_backend(kind));
                println!("Switched to {}.\n", kind.display_name());
            }
            ChatCommand::Model(model) => {
                engine.switch_backend(engine.selection().with_cloud_model(model));
                println!("Cloud model set to {}.\n", model.display_name());
            }
            ChatCommand::Models => {
                println!("{}\n", format_models(engine.selection().cloud_model));
            }
            ChatCommand::HideThink => engine.hide_streaming_think(),
            ChatCommand::Dismiss(index) => match engine.dismiss_think(index) {
                Ok(()) => println!("Reasoning removed from message {}.\n", index),
                Err(err) => println!("{}\n", err),
            },
            ChatCommand::History => print_history(&engine.transcript())?,
            ChatCommand::Invalid(reason) => println!("{}\n", reason),
            ChatCommand::Message(text) => run_turn(&engine, text, &mut input).await?,
        }
    }

    Ok(())
}

/// What a line typed during an in-flight turn did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlightInput {
    Nothing,
    ThinkHidden,
    Busy,
}

/// Only `/hide-think` acts while a reply is in progress; anything else waits.
fn handle_in_flight_line(engine: &ChatEngine, line: &str) -> InFlightInput {
    match parse_command(line) {
        ChatCommand::Empty => InFlightInput::Nothing,
        ChatCommand::HideThink => {
            engine.hide_streaming_think();
            InFlightInput::ThinkHidden
        }
        _ => InFlightInput::Busy,
    }
}

/// Submit one turn and render its progress as it is published
async fn run_turn(
    engine: &Arc<ChatEngine>,
    text: String,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    let mut snapshots = engine.subscribe();
    snapshots.borrow_and_update();

    let mut turn = {
        let engine = Arc::clone(engine);
        tokio::spawn(async move { engine.submit(&text).await })
    };

    let mut renderer = ProgressRenderer::default();
    let mut input_open = true;
    let outcome = loop {
        tokio::select! {
            joined = &mut turn => {
                break joined.map_err(|e| CompanionError::Session(format!("turn task failed: {}", e)))?;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    continue;
                }
                let streaming = snapshots.borrow_and_update().streaming.clone();
                renderer.render(&streaming)?;
            }
            line = input.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    continue;
                };
                match handle_in_flight_line(engine, &line) {
                    InFlightInput::Nothing => {}
                    InFlightInput::ThinkHidden => renderer.think_hidden = true,
                    InFlightInput::Busy => {
                        println!("\n(still answering; send that again once the reply is done)");
                    }
                }
            }
        }
    };

    match outcome {
        SubmitOutcome::Resolved(message) => renderer.finish(&message)?,
        SubmitOutcome::Failed(message) => {
            let mut stdout = io::stdout();
            stdout.execute(SetForegroundColor(Color::Red))?;
            println!("\n{}\n", message.content);
            stdout.execute(ResetColor)?;
        }
        SubmitOutcome::Ignored(_) => {}
    }
    Ok(())
}

/// Prints streamed visible text incrementally
#[derive(Debug, Default)]
struct ProgressRenderer {
    printed: String,
    think_shown: bool,
    think_hidden: bool,
}

impl ProgressRenderer {
    fn render(&mut self, streaming: &StreamingBuffer) -> Result<()> {
        if streaming.think_visible && !self.think_shown && self.printed.is_empty() {
            print_think(&streaming.think_text)?;
            self.think_shown = true;
        }
        if let Some(chunk) = unprinted_suffix(&self.printed, &streaming.visible_text) {
            if self.printed.is_empty() {
                print_prefix()?;
            }
            print!("{}", chunk);
            io::stdout().flush()?;
            self.printed = streaming.visible_text.clone();
        }
        Ok(())
    }

    fn finish(&mut self, message: &Message) -> Result<()> {
        if self.printed.is_empty() {
            let pending = !self.think_shown && !self.think_hidden;
            if let Some(think) = message.think.as_deref().filter(|_| pending) {
                print_think(think)?;
            }
            print_prefix()?;
            println!("{}\n", message.content);
            return Ok(());
        }
        match message.content.strip_prefix(self.printed.as_str()) {
            Some(rest) => println!("{}\n", rest),
            None => {
                println!();
                print_message(message)?;
            }
        }
        Ok(())
    }
}

/// Text of `visible` not yet printed, when it extends what was printed.
/// Holds back text that may still turn out to be an unclosed reasoning block.
fn unprinted_suffix<'a>(printed: &str, visible: &'a str) -> Option<&'a str> {
    let lower = visible.trim_start().to_lowercase();
    if printed.is_empty() && (lower.starts_with("<think") || "<think>".starts_with(&lower)) {
        return None;
    }
    visible
        .strip_prefix(printed)
        .filter(|rest| !rest.is_empty())
}

fn print_prefix() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    print!("\ncompanion: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;
    Ok(())
}

fn print_think(think: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::DarkGrey))?;
    println!("\n[reasoning] {}", think);
    stdout.execute(ResetColor)?;
    Ok(())
}

fn print_message(message: &Message) -> Result<()> {
    if let Some(think) = &message.think {
        print_think(think)?;
    }
    print_prefix()?;
    println!("{}\n", message.content);
    Ok(())
}

fn print_history(transcript: &[Message]) -> Result<()> {
    for (index, message) in transcript.iter().enumerate() {
        let speaker = match message.role {
            Role::User => "you",
            Role::Assistant => "companion",
        };
        let marker = if message.has_think() { " [reasoning]" } else { "" };
        println!("{:>3} {}{}: {}", index, speaker, marker, message.content);
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion::chat::selection::{BackendKind, BackendSelection};
    use companion::llm::factory::TransportSet;
    use companion::llm::mock_transport::{MockOutcome, MockTransport};
    use std::time::Duration;

    fn streaming_engine(local: MockTransport) -> Arc<ChatEngine> {
        let engine = ChatEngine::new(
            TransportSet::new(
                Arc::new(local),
                Arc::new(MockTransport::new(BackendKind::CloudBatch)),
            ),
            "Hi",
            BackendSelection::default().with_backend(BackendKind::LocalStreaming),
        );
        Arc::new(engine.with_turn_timeout(None))
    }

    #[tokio::test]
    async fn test_hide_think_while_reply_streams() {
        let local = MockTransport::new(BackendKind::LocalStreaming).with_outcome(
            MockOutcome::Partial(vec!["<think>plan</think>".to_string(), "Partial".to_string()]),
        );
        let engine = streaming_engine(local);
        let mut snapshots = engine.subscribe();

        let turn = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.submit("q").await })
        };
        tokio::time::timeout(Duration::from_secs(1), async {
            while snapshots.borrow_and_update().streaming.visible_text != "Partial" {
                snapshots.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        assert!(engine.streaming_buffer().think_visible);
        assert_eq!(
            handle_in_flight_line(&engine, "/hide-think"),
            InFlightInput::ThinkHidden
        );
        let streaming = engine.streaming_buffer();
        assert!(!streaming.think_visible);
        assert_eq!(streaming.visible_text, "Partial");
        assert!(engine.is_busy());

        turn.abort();
    }

    #[tokio::test]
    async fn test_other_input_while_busy_is_not_submitted() {
        let local = MockTransport::new(BackendKind::LocalStreaming)
            .with_outcome(MockOutcome::Partial(vec!["Partial".to_string()]));
        let engine = streaming_engine(local.clone());

        let turn = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.submit("q").await })
        };
        tokio::time::timeout(Duration::from_secs(1), async {
            while local.call_count() == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(handle_in_flight_line(&engine, "next question"), InFlightInput::Busy);
        assert_eq!(handle_in_flight_line(&engine, "   "), InFlightInput::Nothing);
        assert_eq!(local.call_count(), 1);
        assert_eq!(engine.transcript().len(), 2);

        turn.abort();
    }

    #[test]
    fn test_unprinted_suffix_extends_printed_text() {
        assert_eq!(unprinted_suffix("", "Hel"), Some("Hel"));
        assert_eq!(unprinted_suffix("Hel", "Hello"), Some("lo"));
        assert_eq!(unprinted_suffix("Hello", "Hello"), None);
    }

    #[test]
    fn test_unprinted_suffix_holds_back_open_reasoning() {
        assert_eq!(unprinted_suffix("", "<thi"), None);
        assert_eq!(unprinted_suffix("", "<think>still going"), None);
        assert_eq!(unprinted_suffix("", "Answer"), Some("Answer"));
    }

    #[test]
    fn test_unprinted_suffix_rejects_rewritten_text() {
        assert_eq!(unprinted_suffix("abc", "xyz"), None);
    }
}
