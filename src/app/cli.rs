//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Input capture-and-replay engine
#[derive(Parser, Debug)]
#[command(name = "replaykit")]
#[command(about = "Record and replay pointer and keyboard input", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a recorded log file
    Inspect {
        /// Recording to inspect
        file: PathBuf,
    },

    /// Replay a recorded log file against the trace injector
    Play {
        /// Recording to replay
        file: PathBuf,

        /// Playback speed multiplier
        #[arg(short, long, default_value_t = 1.0)]
        speed: f64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
