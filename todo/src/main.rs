//! `pocket-todo` binary
//!
//! Loads the list from the data file, applies one command, prints the
//! list and waits for the snapshot to reach disk.

use clap::Parser;
use pocket_todo::cli::{Cli, Command};
use pocket_todo::{Config, TodoApp, view};
use pocket_todo_core::environment::SystemClock;
use pocket_todo_storage::FileKeyValueStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(data_file) = cli.data_file.clone() {
        config.data_file = data_file;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = cli.to_command();
    tracing::debug!(data_file = %config.data_file.display(), ?command, "Starting");

    let storage = Arc::new(FileKeyValueStore::new(&config.data_file));
    let app = TodoApp::start(storage, Arc::new(SystemClock)).await;

    match command {
        Command::List => {},
        Command::Add { text } => {
            app.add(text.join(" ")).await?;
        },
        Command::Toggle { id } => {
            app.toggle(id).await?;
        },
        Command::Delete { id } => {
            app.delete(id).await?;
        },
    }

    if let Err(error) = app.flush(config.shutdown_timeout()).await {
        tracing::warn!(%error, "Pending writes did not finish");
    }

    print!("{}", view::render(&app.todos().await, &app.health().await));

    app.shutdown(config.shutdown_timeout()).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
