//! MOVY command line client.
//!
//! Keeps its session, local accounts, and watch progress in
//! `<data-dir>/movy.json`, the same keys the web front end keeps in local
//! storage.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use movy::{AuthManager, Config, FileStore};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, HistoryCommands};
use output::TerminalPresenter;

const STORE_FILE: &str = "movy.json";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        // Auth failures were already shown as alerts.
        let presented = e
            .downcast_ref::<movy::Error>()
            .is_some_and(|e| e.as_auth().is_some());
        if !presented {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = Some(api_url);
    }

    let data_dir = cli.data_dir.unwrap_or_else(|| PathBuf::from("."));
    let store_path = data_dir.join(STORE_FILE);
    tracing::debug!(path = %store_path.display(), "Opening store");
    let store = Arc::new(FileStore::open(&store_path)?);

    let manager = Arc::new(
        AuthManager::from_config(config, store)?
            .with_presenter(Arc::new(TerminalPresenter::new(cli.format))),
    );
    manager.restore_session()?;

    let format = cli.format;
    match cli.command {
        Commands::Signup(args) => commands::account::signup(&manager, &args, format).await,
        Commands::Login(args) => commands::account::login(&manager, &args, format).await,
        Commands::Logout => commands::account::logout(&manager),
        Commands::Whoami => commands::account::whoami(&manager, format),
        Commands::Status => commands::sync::status(&manager, format).await,
        Commands::Sync => commands::sync::sync(&manager, format).await,
        Commands::Pending => commands::sync::pending(&manager, format),
        Commands::History(HistoryCommands::Pull) => commands::history::pull(&manager, format).await,
        Commands::History(HistoryCommands::List) => commands::history::list(&manager, format),
        Commands::Watch(args) => commands::sync::watch(&manager, &args).await,
    }
}
