//! avd-runner - boot Android emulators from the command line

use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use avd_runner::commands::{
    BestCommand, ListCommand, PortCommand, Session, StartCommand, StartedCommand, WaitCommand,
};
use avd_runner::core::{AppConfig, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "avd-runner", version, about = "Discover, select and boot Android emulators")]
struct Cli {
    /// Android SDK root, searched when a tool is not on PATH
    #[arg(long, global = true)]
    sdk: Option<PathBuf>,

    /// Configuration file to use instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List emulator images
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the image best suited to an API level
    Best {
        #[arg(long)]
        api: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// List running emulators
    Started,
    /// Print the next free emulator port
    Port,
    /// Start an emulator and wait for it to boot
    Start {
        /// Image name, defaults to the best image for --api
        avd: Option<String>,
        #[arg(long)]
        api: Option<u32>,
        /// Boot timeout in milliseconds, -1 waits forever
        #[arg(long, allow_negative_numbers = true)]
        timeout_ms: Option<i64>,
    },
    /// Wait for an emulator on a port to boot
    Wait {
        port: u16,
        /// Boot timeout in milliseconds, -1 waits forever
        #[arg(long, allow_negative_numbers = true)]
        timeout_ms: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries results and boot progress.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("{} v{}", APP_NAME, VERSION);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path).await?,
        None => AppConfig::load().await?,
    };
    let session = Session::new(config, cli.sdk);

    match cli.command {
        Commands::List { json } => ListCommand { json }.execute(&session).await,
        Commands::Best { api, json } => BestCommand { api, json }.execute(&session).await,
        Commands::Started => StartedCommand.execute(&session).await,
        Commands::Port => PortCommand.execute(&session).await,
        Commands::Start { avd, api, timeout_ms } => {
            StartCommand { avd, api, timeout_ms }.execute(&session).await
        }
        Commands::Wait { port, timeout_ms } => WaitCommand { port, timeout_ms }.execute(&session).await,
    }
}
