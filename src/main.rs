//! folio-tui: a terminal portfolio of GitHub repositories
//!
//! Lists a user's most recently pushed repositories with their latest
//! release, animates rows on hover, scans the table when left idle and
//! keeps a live clock for a fixed time zone.

mod app;
mod cli;
mod clock;
mod data;
mod effects;
mod rows;
mod sequencer;
mod ui;

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use cli::{AppConfig, Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to a file so the TUI is never written over.
/// Without a usable file, logging is disabled.
fn init_tracing(log_file: &Path) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = log_file
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(log_file));

    match file {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %log_file.display(), "Logging initialized");
        }
        Err(_) => tracing_subscriber::registry().with(env_filter).init(),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Show(args) => {
            let config = AppConfig::from_show_command(args);
            init_tracing(&config.log_file);

            // Run the TUI application
            app::run(config)?;
        }
    }

    Ok(())
}
