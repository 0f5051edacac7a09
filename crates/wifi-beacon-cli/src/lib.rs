//! wifi-beacon CLI library
//!
//! Command-line parsing, layered configuration and command dispatch for the
//! `wifi-beacon` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use config::AppConfig;
pub use error::{CliError, Result};
