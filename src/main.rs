//! Analizar CLI
//!
//! # Usage
//!
//! ```bash
//! # Decode logs/PSO/d10/*.cbor into a run table
//! analizar convert -a PSO -d d10
//!
//! # Summaries, CSV exports and plots of that batch
//! analizar analyse -a PSO -d d10
//!
//! # Rank every configured algorithm on d10
//! analizar compare -d d10 --config analizar.yaml
//! ```

use analizar::cli::{run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.code());
            ExitCode::FAILURE
        }
    }
}
