mod app;
mod client;
mod config;
mod models;
mod session;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::client::PuterClient;
use crate::config::Config;
use crate::session::ChatSession;

#[derive(Parser)]
#[command(name = "puterchat")]
#[command(version)]
#[command(about = "Terminal chat client for the Puter hosted AI API", long_about = None)]
struct Cli {
    /// Model to chat with (overrides the configured default)
    #[arg(short, long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the model identifiers the endpoint is known to accept
    Models,
}

fn list_models() {
    println!("Known models:\n");
    for model in models::KNOWN_MODELS {
        if model == models::DEFAULT_MODEL {
            println!("  • {} (default)", model);
        } else {
            println!("  • {}", model);
        }
    }
}

/// Log to a file under the config dir; stderr belongs to the TUI.
fn init_tracing(config: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(&config.puterchat_home, "puterchat.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("puterchat=info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Models) = cli.command {
        list_models();
        return Ok(());
    }

    let mut config = Config::load()?;
    let _guard = init_tracing(&config);

    if let Some(model) = cli.model {
        config.default_model = model;
    }

    let client = Arc::new(PuterClient::new(config.clone()).context("Failed to create client")?);
    let session = ChatSession::new(
        client,
        config.default_model.clone(),
        config.system_prompt.clone(),
    );

    app::run(App::new(session)).await
}
