//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "polymix", version, about = "Cross-venue hedged pair executor")]
pub struct Cli {
    /// Directory holding default.toml and environment overlays
    #[arg(long, default_value = "config")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the placement and settlement loops until interrupted
    Run {
        /// JSON array of candidate trades, re-read every placement tick
        #[arg(long, default_value = "data/candidates.json")]
        candidates: PathBuf,
        /// JSON map of market id to resolution, re-read every sweep
        #[arg(long, default_value = "data/resolutions.json")]
        resolutions: PathBuf,
    },
    /// Print the current ledger snapshot as JSON
    State,
    /// Wipe the ledger back to its initial balance
    Reset {
        /// Must match the configured admin.reset_token
        #[arg(long, env = "POLYMIX_RESET_TOKEN", hide_env_values = true)]
        token: String,
    },
}
