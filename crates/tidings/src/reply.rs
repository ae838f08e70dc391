// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints a running generation to the terminal.

use std::io::Write;

use colored::Colorize;
use futures::StreamExt;
use tidings_agent::{Assistant, StartOutcome};
use tidings_core::types::{GenerationEvent, TerminalError};

/// How a printed reply ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplyEnd {
    Completed,
    Stopped,
    Failed(String),
    Rejected(String),
}

/// Starts a generation and prints its chunks until a terminal event.
///
/// Ctrl+C while the reply is streaming asks the assistant to stop; the
/// stream still runs to its terminal event.
pub(crate) async fn stream_reply(
    assistant: &Assistant,
    query: &str,
    model: Option<&str>,
) -> ReplyEnd {
    match assistant.start_generation(None, query, model).await {
        StartOutcome::Accepted { .. } => {}
        StartOutcome::Rejected(rejection) => {
            let reason = rejection.to_string();
            eprintln!("{}", reason.yellow());
            return ReplyEnd::Rejected(reason);
        }
    }

    let mut events = assistant.subscribe_events();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stop_sent = false;
    let mut stdout = std::io::stdout();

    let end = loop {
        tokio::select! {
            event = events.next() => match event {
                Some(GenerationEvent::Chunk { text }) => {
                    print!("{text}");
                    stdout.flush().ok();
                }
                Some(GenerationEvent::Done { .. }) | None => break ReplyEnd::Completed,
                Some(GenerationEvent::Error { error: TerminalError::Interrupted }) => {
                    break ReplyEnd::Stopped;
                }
                Some(GenerationEvent::Error { error: TerminalError::Failed(message) }) => {
                    break ReplyEnd::Failed(message);
                }
            },
            _ = &mut ctrl_c, if !stop_sent => {
                stop_sent = true;
                assistant.stop_generation();
            }
        }
    };
    println!();

    match &end {
        ReplyEnd::Stopped => println!("{}", "(stopped)".dimmed()),
        ReplyEnd::Failed(message) => eprintln!("{}: {message}", "error".red()),
        ReplyEnd::Completed | ReplyEnd::Rejected(_) => {}
    }
    end
}
