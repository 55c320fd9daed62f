// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `campuslink chat` command implementation.
//!
//! Interactive REPL over the connectivity context. Each line is sent to the
//! current backend, or queued when none is reachable; queued questions are
//! answered in the background once the connection returns.

use campuslink_agent::ConnectivityContext;
use campuslink_chat::{OutboxEvent, SendOutcome};
use campuslink_config::CampusLinkConfig;
use campuslink_core::{AnswerSource, AskResponse, CampusLinkError};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::resolve_school;

/// One line per source: `[1] Academic calendar <url>` or `[api] weather`.
fn format_sources(sources: &[AnswerSource]) -> Vec<String> {
    sources
        .iter()
        .filter_map(|source| match source {
            AnswerSource::Citation { i, text, url } => {
                let mut line = format!("[{i}]");
                if let Some(text) = text {
                    line.push(' ');
                    line.push_str(text);
                }
                if let Some(url) = url {
                    line.push_str(&format!(" <{url}>"));
                }
                Some(line)
            }
            AnswerSource::Api { kind, name } => Some(format!("[{kind}] {name}")),
            AnswerSource::Other(_) => None,
        })
        .collect()
}

fn print_answer(response: &AskResponse) {
    if response.is_degraded() {
        println!("{}", response.answer.yellow());
    } else {
        println!("{}", response.answer);
    }
    for line in format_sources(&response.sources) {
        println!("  {}", line.dimmed());
    }
    println!();
}

/// Pretty school name for the greeting: `san-jose_state` -> `San Jose State`.
fn display_school(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs the `campuslink chat` REPL.
pub async fn run_chat(
    config: &CampusLinkConfig,
    school: Option<String>,
) -> Result<(), CampusLinkError> {
    let school = resolve_school(config, school)?;
    let context = ConnectivityContext::init(config).await?;
    context.set_school(&school).await?;

    // Answers to queued questions arrive asynchronously.
    let mut events = context.outbox().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(OutboxEvent::Delivered { text, response }) => {
                    println!("\n{} {text}", "(sent from queue)".dimmed());
                    print_answer(&response);
                }
                Ok(OutboxEvent::Requeued { count, .. }) => {
                    println!(
                        "{}",
                        format!("({count} queued message(s) will be retried)").dimmed()
                    );
                }
                Ok(OutboxEvent::Queued { .. }) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut rl = DefaultEditor::new()
        .map_err(|e| CampusLinkError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "campuslink chat".bold().green());
    println!(
        "Hi! How can I help you with {} today?",
        display_school(&school)
    );
    println!(
        "Type {} to exit, {} for connectivity, {} to list queued messages.\n",
        "/quit".yellow(),
        "/status".yellow(),
        "/queue".yellow()
    );

    let prompt = format!("{}> ", school.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match trimmed {
                    "/status" => println!("{}\n", context.snapshot().badge()),
                    "/queue" => match context.outbox().read_queue().await {
                        Ok(texts) if texts.is_empty() => println!("(queue empty)\n"),
                        Ok(texts) => {
                            for (n, text) in texts.iter().enumerate() {
                                println!("  {}. {text}", n + 1);
                            }
                            println!();
                        }
                        Err(e) => eprintln!("{}: {e}", "error".red()),
                    },
                    question => match context.send(question).await {
                        Ok(SendOutcome::Delivered(response)) => print_answer(&response),
                        Ok(SendOutcome::Queued(entry)) => {
                            debug!(id = entry.id, "question queued");
                            println!(
                                "{}\n",
                                "(Queued. Will send when connection is back.)".dimmed()
                            );
                        }
                        Err(e) => {
                            eprintln!("{}: {e}", "error".red());
                            eprintln!("Failed to get response. Please try again.\n");
                        }
                    },
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    context.dispose().await;
    printer.abort();
    Ok(())
}
