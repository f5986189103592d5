use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::updaters::Platform;

#[derive(Debug, Parser)]
#[command(
    name = "rewards-updater",
    about = "Cross-platform mention ledger and social media updater",
    version
)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, env = "REWARDS_UPDATER_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply database migrations and exit.
    Migrate,

    /// Add a reaction to a remote message.
    React {
        platform: Platform,
        url: String,
        reaction: String,
    },

    /// Post a threaded reply to a remote message.
    Reply {
        platform: Platform,
        url: String,
        text: String,
    },

    /// Fetch the canonical message record for a URL.
    Fetch { platform: Platform, url: String },

    /// Show recent action log entries, newest first.
    Log {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}
