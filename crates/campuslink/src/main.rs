// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! campuslink - connectivity monitor and offline chat queue.
//!
//! This is the binary entry point.

mod chat;
mod queue;
mod status;
mod watch;

use std::path::PathBuf;

use campuslink_config::CampusLinkConfig;
use campuslink_core::CampusLinkError;
use clap::{Parser, Subcommand};
use colored::Colorize;

/// campuslink - reach the campus advisor from flaky networks.
#[derive(Parser, Debug)]
#[command(name = "campuslink", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe the backends once and report the connectivity state.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Keep monitoring until interrupted, replaying the queue on reconnect.
    Watch {
        /// School whose queue should be flushed on reconnect.
        #[arg(long)]
        school: Option<String>,
    },
    /// Interactive chat that queues questions while offline.
    Chat {
        /// School slug, e.g. `sjsu`.
        #[arg(long)]
        school: Option<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
    /// Inspect or clear a school's queued messages.
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Subcommand, Debug)]
enum QueueAction {
    /// List queued messages in send order.
    List {
        #[arg(long)]
        school: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete every queued message for the school.
    Clear {
        #[arg(long)]
        school: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => campuslink_config::load_and_validate_path(path),
        None => campuslink_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            campuslink_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.client.log_level);

    let result = match cli.command {
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Watch { school }) => watch::run_watch(&config, school).await,
        Some(Commands::Chat { school }) => chat::run_chat(&config, school).await,
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Queue { action }) => match action {
            QueueAction::List { school, json } => queue::run_list(&config, school, json).await,
            QueueAction::Clear { school } => queue::run_clear(&config, school).await,
        },
        None => {
            println!("campuslink: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Picks the school from the command line, falling back to
/// `chat.default_school`.
fn resolve_school(
    config: &CampusLinkConfig,
    school: Option<String>,
) -> Result<String, CampusLinkError> {
    school
        .or_else(|| config.chat.default_school.clone())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CampusLinkError::Config(
                "no school given; pass --school or set chat.default_school".to_string(),
            )
        })
}

fn print_config(config: &CampusLinkConfig) -> Result<(), CampusLinkError> {
    let rendered = campuslink_config::to_toml_string(config)
        .map_err(|e| CampusLinkError::Config(format!("cannot render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("campuslink={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
