//! CLI argument definitions for the MOVY binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// MOVY command line client
#[derive(Parser, Debug)]
#[command(name = "movy")]
#[command(about = "MOVY: offline-first account and session client")]
#[command(version)]
pub struct Cli {
    /// Base URL of the MOVY API. Without it every account is offline.
    #[arg(long, global = true, env = "MOVY_API_URL")]
    pub api_url: Option<Url>,

    /// Directory holding movy.json
    #[arg(short = 'D', long, global = true, env = "MOVY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human", env = "MOVY_FORMAT")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account, offline if the API cannot be reached
    Signup(SignupArgs),
    /// Log in with email and password
    Login(LoginArgs),
    /// End the current session
    Logout,
    /// Show the current session
    Whoami,
    /// Probe the API and show connectivity and pending accounts
    Status,
    /// Push pending accounts to the API now
    Sync,
    /// List accounts waiting to be synced
    Pending,
    /// Watch history commands
    #[command(subcommand)]
    History(HistoryCommands),
    /// Run the periodic connectivity check until interrupted
    Watch(WatchArgs),
}

/// Arguments for the signup command
#[derive(clap::Args, Debug)]
pub struct SignupArgs {
    /// Display name
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub email: String,

    #[arg(short, long, env = "MOVY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the login command
#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,

    #[arg(short, long, env = "MOVY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// Fetch watch history from the API and merge it locally
    Pull,
    /// Show locally stored progress, most recent first
    List,
}

/// Arguments for the watch command
#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// Seconds between checks (defaults to MOVY_SYNC_INTERVAL_SECS or 120)
    #[arg(short, long)]
    pub interval: Option<u64>,
}
