//! fixbib CLI library.
//!
//! Configuration loading, the fix command and report formatting behind the
//! `fixbib` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
