//! Command handlers and progress output.

mod commands;
mod logging;

pub use commands::{analyse, compare, convert, run_command};
pub use logging::{log, LogLevel};

pub use crate::config::Cli;
