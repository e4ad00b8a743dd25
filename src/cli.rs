//! Command-line interface argument parsing for folio-tui.
//!
//! - `folio-tui show`
//! - `folio-tui show --user likahang --count 10`
//! - `GITHUB_TOKEN=... folio-tui show` to include private repositories

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_USER: &str = "likahang";
pub const DEFAULT_TIME_ZONE: &str = "Asia/Taipei";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";

/// A terminal portfolio of a GitHub user's repositories.
#[derive(Parser, Debug)]
#[command(name = "folio-tui")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the portfolio dashboard
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// GitHub user whose public repositories are listed when no token is set
    #[arg(short, long, default_value = DEFAULT_USER)]
    pub user: String,

    /// Maximum number of repositories to list
    #[arg(short, long, default_value = "20", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub count: u32,

    /// IANA time zone for the clock and push dates
    #[arg(short = 'z', long, default_value = DEFAULT_TIME_ZONE)]
    pub time_zone: String,

    /// Clock refresh interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,

    /// Personal access token; switches to the owner endpoint including private repositories
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Base URL preview images are served from
    #[arg(long, default_value = DEFAULT_RAW_URL)]
    pub raw_url: String,

    /// Log file path. Defaults to the user cache directory
    #[arg(long, env = "FOLIO_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub username: String,
    pub count: u32,
    pub time_zone: String,
    pub clock_interval: Duration,
    pub token: Option<String>,
    pub api_url: String,
    pub raw_url: String,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Create AppConfig from the `show` arguments
    pub fn from_show_command(args: ShowArgs) -> Self {
        // A blank token (e.g. `GITHUB_TOKEN=`) counts as absent
        let token = args
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let log_file = args.log_file.unwrap_or_else(default_log_file);

        AppConfig {
            username: args.user,
            count: args.count,
            time_zone: args.time_zone,
            clock_interval: Duration::from_millis(args.interval_ms.max(1)),
            token,
            api_url: args.api_url,
            raw_url: args.raw_url,
            log_file,
        }
    }
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio-tui")
        .join("folio-tui.log")
}
