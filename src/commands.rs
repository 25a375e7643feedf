use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::history::{HistoryStore, Message, Role};
use crate::session::{ChatSession, UploadOutcome};

/// Run the interactive chat loop.
#[inline]
pub fn run_chat() -> Result<()> {
    let config = Config::load()?;
    let mut session = ChatSession::new(config).context("Failed to start chat session")?;

    print_banner(&session);

    loop {
        let line: String = Input::new()
            .with_prompt(style("you").bold().green().to_string())
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        match parse_chat_command(line) {
            ChatCommand::Quit => {
                eprintln!("{}", style("Goodbye!").dim());
                return Ok(());
            }
            ChatCommand::Clear => {
                session.clear_history()?;
                eprintln!("{}", style("History cleared.").yellow());
            }
            ChatCommand::Upload(paths) => {
                if paths.is_empty() {
                    eprintln!("{}", style("Usage: /upload <file> [<file> ...]").yellow());
                    continue;
                }
                if let Err(e) = upload_with_progress(&mut session, &paths) {
                    eprintln!("{} {:#}", style("Upload failed:").red(), e);
                }
            }
            ChatCommand::Help => print_help(),
            ChatCommand::Ask(query) => {
                if let Err(e) = stream_answer(&mut session, &query) {
                    eprintln!("{} {:#}", style("Request failed:").red(), e);
                }
            }
        }
    }
}

/// Answer a single question and exit, reusing the saved transcript.
#[inline]
pub fn run_ask(question: &str) -> Result<()> {
    let config = Config::load()?;
    let mut session = ChatSession::new(config).context("Failed to start chat session")?;

    stream_answer(&mut session, question)
}

/// Print the persisted conversation transcript.
#[inline]
pub fn show_history() -> Result<()> {
    let config = Config::load()?;
    let store = HistoryStore::new(config.history_path());
    let messages = store.load().context("Failed to load history")?;

    if messages.is_empty() {
        println!("No conversation history yet.");
        println!("Use 'tutor-chat chat' to start a conversation.");
        return Ok(());
    }

    println!("Conversation history ({} messages):", messages.len());
    println!();
    for message in &messages {
        print_message(message);
    }

    Ok(())
}

/// Delete the persisted conversation transcript.
#[inline]
pub fn clear_history() -> Result<()> {
    let config = Config::load()?;
    let store = HistoryStore::new(config.history_path());
    store.clear().context("Failed to clear history")?;

    println!("Conversation history cleared.");
    Ok(())
}

enum ChatCommand {
    Ask(String),
    Upload(Vec<PathBuf>),
    Clear,
    Help,
    Quit,
}

fn parse_chat_command(line: &str) -> ChatCommand {
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    match parts.next() {
        Some("quit" | "exit") => ChatCommand::Quit,
        Some("clear") => ChatCommand::Clear,
        Some("help") => ChatCommand::Help,
        Some("upload") => ChatCommand::Upload(parts.map(PathBuf::from).collect()),
        _ => {
            // Unknown slash command; treat the whole line as a question.
            ChatCommand::Ask(line.to_string())
        }
    }
}

fn upload_with_progress(session: &mut ChatSession, paths: &[PathBuf]) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Indexing {} file(s)...", paths.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = session.upload(paths);
    spinner.finish_and_clear();

    match outcome? {
        UploadOutcome::Indexed { chunks, dimension } => {
            info!("Indexed {} chunks at {} dimensions", chunks, dimension);
            eprintln!(
                "{}",
                style(format!(
                    "✓ Indexed {} chunks ({} dimensions). Answers will use your documents.",
                    chunks, dimension
                ))
                .green()
            );
        }
        UploadOutcome::Empty => {
            eprintln!(
                "{}",
                style("No extractable text found; answering without document context.").yellow()
            );
        }
    }

    Ok(())
}

fn stream_answer(session: &mut ChatSession, query: &str) -> Result<()> {
    eprint!("{} ", style("tutor").bold().cyan());
    std::io::stderr().flush().ok();

    session.ask(query, |fragment| {
        print!("{}", fragment);
        std::io::stdout().flush().ok();
    })?;

    println!();
    Ok(())
}

fn print_banner(session: &ChatSession) {
    eprintln!("{}", style("Tutor Chat").bold().cyan());
    eprintln!(
        "{}",
        style("Ask anything, /upload files for document context, /help for commands.").dim()
    );
    let stored = session.messages().len();
    if stored > 0 {
        eprintln!(
            "{}",
            style(format!("Resuming conversation with {} stored messages.", stored)).dim()
        );
    }
    eprintln!();
}

fn print_help() {
    eprintln!("Commands:");
    eprintln!("  /upload <file> [...]  index documents for retrieval context");
    eprintln!("  /clear                wipe the conversation history");
    eprintln!("  /help                 show this help");
    eprintln!("  /quit                 leave the chat");
}

fn print_message(message: &Message) {
    let label = match message.role {
        Role::System => style("system").dim(),
        Role::User => style("you").bold().green(),
        Role::Assistant => style("tutor").bold().cyan(),
    };
    println!("{}: {}", label, message.content);
    println!();
}
