// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tidings chat` command implementation.
//!
//! Launches an interactive REPL with colored prompt, streaming output,
//! and readline history. Slash commands manage conversations; anything
//! else is a question for the assistant. Ctrl+C during a reply stops it.

use std::path::PathBuf;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tidings_agent::{Assistant, ConversationSummary};
use tidings_config::model::TidingsConfig;
use tidings_core::TidingsError;

use crate::ask::media_type_for;
use crate::reply::stream_reply;

/// Characters of a conversation id shown in listings.
const SHORT_ID: usize = 8;

/// A parsed line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Quit,
    New,
    List,
    Switch(String),
    Status,
    Rename(String),
    Image(PathBuf),
    Help,
    Unknown(String),
    Ask(String),
}

fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return ShellCommand::Ask(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name, arg) {
        ("quit" | "exit", _) => ShellCommand::Quit,
        ("new", _) => ShellCommand::New,
        ("list", _) => ShellCommand::List,
        ("status", _) => ShellCommand::Status,
        ("help", _) => ShellCommand::Help,
        ("switch", id) if !id.is_empty() => ShellCommand::Switch(id.to_string()),
        ("rename", name) if !name.is_empty() => ShellCommand::Rename(name.to_string()),
        ("image", path) if !path.is_empty() => ShellCommand::Image(PathBuf::from(path)),
        _ => ShellCommand::Unknown(line.to_string()),
    }
}

/// Runs the `tidings chat` interactive REPL.
pub async fn run_shell(config: TidingsConfig, model: Option<String>) -> Result<(), TidingsError> {
    let assistant = crate::build_assistant(&config).await?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| TidingsError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", config.agent.name.bold().green());
    println!(
        "Type {} for commands, {} to exit.\n",
        "/help".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", config.agent.name.green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "(use /quit to exit)".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        let command = parse_command(&line);
        if command == ShellCommand::Quit {
            break;
        }
        if let Err(e) = handle_command(&assistant, command, model.as_deref()).await {
            eprintln!("{}: {e}", "error".red());
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

async fn handle_command(
    assistant: &Assistant,
    command: ShellCommand,
    model: Option<&str>,
) -> Result<(), TidingsError> {
    let store = assistant.conversations();
    match command {
        ShellCommand::Ask(query) => {
            stream_reply(assistant, &query, model).await;
        }
        ShellCommand::New => {
            let conversation = store.create().await;
            store.switch(&conversation.id).await?;
            println!("{}", format!("started {}", short_id(&conversation.id)).dimmed());
        }
        ShellCommand::List => {
            let current = store.current_id().await;
            for summary in store.list().await {
                println!("{}", list_line(&summary, current.as_deref()));
            }
        }
        ShellCommand::Switch(prefix) => {
            let id = resolve_id(&store.list().await, &prefix)?;
            store.switch(&id).await?;
            let conversation = store.get(&id).await?;
            println!(
                "{}",
                format!("switched to {} ({} messages)", conversation.name, conversation.messages.len())
                    .dimmed()
            );
        }
        ShellCommand::Rename(name) => {
            let id = store.current().await.id;
            store.rename(&id, &name).await?;
        }
        ShellCommand::Image(path) => {
            let bytes = std::fs::read(&path).map_err(|e| {
                TidingsError::InvalidRequest(format!("cannot read image {}: {e}", path.display()))
            })?;
            let id = store.current().await.id;
            let image = store.attach_image(&id, media_type_for(&path), &bytes).await?;
            println!("{}", format!("attached {}", image.name).dimmed());
        }
        ShellCommand::Status => {
            let status = assistant.status().await;
            println!("conversation: {} ({})", status.conversation_name, short_id(&status.conversation_id));
            println!("messages:     {}", status.message_count);
            println!(
                "document:     {}",
                status.current_document.as_deref().unwrap_or("none")
            );
            println!("context:      {} turns", status.max_context_turns);
            println!("generating:   {}", status.is_generating);
            println!("tools:        {}", assistant.tool_names().join(", "));
        }
        ShellCommand::Help => print_help(),
        ShellCommand::Unknown(line) => {
            println!("{}", format!("unknown command: {line} (try /help)").yellow());
        }
        ShellCommand::Quit => {}
    }
    Ok(())
}

fn print_help() {
    println!("  /new              start a new conversation");
    println!("  /list             list conversations");
    println!("  /switch <id>      switch conversation (id prefix is enough)");
    println!("  /rename <name>    rename the current conversation");
    println!("  /image <path>     attach an image to the next question");
    println!("  /status           show assistant status");
    println!("  /quit             exit");
    println!("  Ctrl+C            stop the reply being written");
}

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID).unwrap_or(id)
}

fn list_line(summary: &ConversationSummary, current: Option<&str>) -> String {
    let marker = if current == Some(summary.id.as_str()) { "*" } else { " " };
    format!(
        "{marker} {}  {}  ({} messages)",
        short_id(&summary.id),
        summary.name,
        summary.message_count
    )
}

/// Finds the one conversation whose id starts with `prefix`.
fn resolve_id(conversations: &[ConversationSummary], prefix: &str) -> Result<String, TidingsError> {
    let mut matches = conversations.iter().filter(|c| c.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found.id.clone()),
        (Some(_), Some(_)) => Err(TidingsError::InvalidRequest(format!(
            "conversation id `{prefix}` is ambiguous"
        ))),
        (None, _) => Err(TidingsError::ConversationNotFound(prefix.to_string())),
    }
}
