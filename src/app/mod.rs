//! Application layer: command-line interface and configuration

pub mod cli;
pub mod config;

pub use cli::{parse_args, Cli, Commands};
pub use config::Config;
