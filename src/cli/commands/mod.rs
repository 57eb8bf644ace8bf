//! CLI command implementations

pub mod analyse;
pub mod compare;
pub mod convert;

use analizar_common::Result;

use crate::cli::LogLevel;
use crate::config::{AnalysisConfig, Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);
    let config = AnalysisConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Convert(args) => convert::run_convert(args, &config, log_level),
        Command::Analyse(args) => analyse::run_analyse(args, &config, log_level),
        Command::Compare(args) => compare::run_compare(args, &config, log_level),
    }
}
