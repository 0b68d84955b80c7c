//! Command-line interface argument parsing for made-dash.
//!
//! - `made-dash filters show`
//! - `made-dash filters repos 3 7`
//! - `made-dash compare 20 --industry 89 --elite 24 --lower-is-better`
//! - `made-dash score amplifier.json`

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use made_dash::data::{RepoId, SquadId, UserId, RECORDS_DB_FILE};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "MADE_DASH_DIR";

/// Filter, benchmark and productivity tooling for the MADE dashboard.
#[derive(Parser, Debug)]
#[command(name = "made-dash")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the local record database
    /// Defaults to $MADE_DASH_DIR, then the platform data directory
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or change the persisted dashboard filters
    Filters {
        #[command(subcommand)]
        action: FilterAction,
    },

    /// Place a value against industry and elite benchmarks
    Compare {
        /// Observed value
        #[arg(allow_hyphen_values = true)]
        value: f64,

        /// Industry benchmark
        #[arg(long)]
        industry: f64,

        /// Elite benchmark
        #[arg(long)]
        elite: f64,

        /// Smaller values are better (turnaround, bug share)
        #[arg(long)]
        lower_is_better: bool,
    },

    /// Score an Amplifier metrics bundle read from a JSON file
    Score {
        /// Path to the JSON bundle
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum FilterAction {
    /// Print the current filters as JSON
    Show,

    /// Select the last N days ending today
    Preset { days: u32 },

    /// Select an explicit range (YYYY-MM-DD)
    Range { start: NaiveDate, end: NaiveDate },

    /// Select repositories; no ids removes the repository filter
    Repos { ids: Vec<RepoId> },

    /// Select a squad (clears the user); no id removes the squad filter
    Squad { id: Option<SquadId> },

    /// Select a user (clears the squad); no id removes the user filter
    User { id: Option<UserId> },

    /// Reset to the last 90 days with nothing else selected
    Clear,
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
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_cli(data_dir: Option<String>) -> Self {
        AppConfig {
            data_dir: resolve_data_dir(data_dir, std::env::var(DATA_DIR_ENV).ok()),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_DB_FILE)
    }
}

/// `--data-dir`, then the environment override, then `<data dir>/made-dash`
fn resolve_data_dir(explicit: Option<String>, env_dir: Option<String>) -> PathBuf {
    explicit
        .or(env_dir)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("made-dash")
        })
}
