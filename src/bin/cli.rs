//! Notice Watch CLI
//!
//! Runs the HTTP API, or performs a single store operation from the shell.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use notice_watch::{
    error::{AppError, Result},
    models::Config,
    pipeline::run_check,
    server,
    services::HtmlNoticeSource,
    storage::NoticeStore,
};

/// Notice Watch - notice board change detector
#[derive(Parser, Debug)]
#[command(
    name = "notice-watch",
    version,
    about = "Detects and stores new notices from a notice board"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Fetch the source once and store new notices
    Check,

    /// Print every stored notice as JSON
    List,

    /// Show store metadata
    Info,

    /// Remove every stored notice
    Reset,

    /// Write a backup of the store
    Backup,

    /// Replace the store with a backup
    Restore {
        /// Backup file (relative names resolve against the backup directory)
        file: PathBuf,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, load_err) = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);
    if let Some(e) = load_err {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
    }

    let command = cli.command.unwrap_or(Command::Serve { port: None });

    match command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            let store = Arc::new(NoticeStore::open(&config.storage).await);
            let source = Arc::new(HtmlNoticeSource::new(&config.source)?);
            server::serve(&config, store, source).await?;
        }
        Command::Check => {
            let source = HtmlNoticeSource::new(&config.source)?;
            let store = NoticeStore::open(&config.storage).await;
            let outcome = run_check(&source, &store).await?;
            log::info!("{}", outcome.message());
            print_json(&outcome)?;
        }
        Command::List => {
            let store = NoticeStore::open(&config.storage).await;
            print_json(&store.list_all().await)?;
        }
        Command::Info => {
            let store = NoticeStore::open(&config.storage).await;
            print_json(&store.info().await)?;
        }
        Command::Reset => {
            let store = NoticeStore::open(&config.storage).await;
            store.reset().await?;
        }
        Command::Backup => {
            let store = NoticeStore::open(&config.storage).await;
            let path = store.backup().await?;
            println!("{}", path.display());
        }
        Command::Restore { file } => {
            let store = NoticeStore::open(&config.storage).await;
            if !store.restore(&file).await? {
                return Err(AppError::validation(format!(
                    "{} is not a restorable backup",
                    file.display()
                )));
            }
            log::info!("Restored {} notices", store.count().await);
        }
        Command::Validate => {
            config.validate()?;
            log::info!("Configuration {} is valid", cli.config.display());
        }
    }

    Ok(())
}
