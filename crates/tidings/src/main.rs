// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tidings - a local news-aware chat assistant.
//!
//! This is the binary entry point. Lifecycle lives here; everything the
//! assistant does lives in the library crates.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod ask;
mod reply;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tidings_agent::Assistant;
use tidings_config::model::TidingsConfig;
use tidings_core::types::HealthStatus;
use tidings_core::{PluginAdapter, TidingsError};
use tidings_ollama::OllamaProvider;
use tidings_tools::NewsProvider;
use tracing::{info, warn};

/// Tidings - a local news-aware chat assistant.
#[derive(Parser, Debug)]
#[command(name = "tidings", version, about, long_about = None)]
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
    /// Launch an interactive chat session.
    Chat {
        /// Ollama model to answer with.
        #[arg(long)]
        model: Option<String>,
    },
    /// Ask a single question and print the answer.
    Ask {
        /// The question.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Ollama model to answer with.
        #[arg(long)]
        model: Option<String>,
        /// Image file to send with the question (repeatable).
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tidings_config::load_and_validate_path(path),
        None => tidings_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tidings_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Chat { model }) => shell::run_shell(config, model).await,
        Some(Commands::Ask {
            query,
            model,
            images,
        }) => ask::run_ask(config, &query.join(" "), model, &images).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("tidings: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tidings={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Wires the Ollama model and the news tools into an assistant.
pub(crate) async fn build_assistant(config: &TidingsConfig) -> Result<Assistant, TidingsError> {
    let model = Arc::new(OllamaProvider::new(&config.ollama)?);
    match model.health_check().await? {
        HealthStatus::Healthy => info!(model = %model.default_model(), "ollama ready"),
        HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
            warn!(%reason, "ollama is not ready");
            eprintln!("{}", format!("warning: {reason}").yellow());
        }
    }

    let news = NewsProvider::new(&config.news)?;
    if news.is_demo() {
        eprintln!(
            "{}",
            "news: no API key configured, serving demo data".dimmed()
        );
    }

    Assistant::builder(model)
        .config(config.clone())
        .tool_provider(Arc::new(news))?
        .build()
}

fn print_config(config: &TidingsConfig) -> Result<(), TidingsError> {
    let rendered = render_config(config)?;
    print!("{rendered}");
    Ok(())
}

/// Serializes the configuration as TOML with secrets masked.
fn render_config(config: &TidingsConfig) -> Result<String, TidingsError> {
    let mut shown = config.clone();
    if shown.news.api_key.is_some() {
        shown.news.api_key = Some("********".into());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| TidingsError::Config(format!("failed to render configuration: {e}")))
}
