//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Analizar: post-processing for metaheuristic benchmark runs
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "analizar")]
#[command(version)]
#[command(about = "Summarise metaheuristic run logs and rank algorithms with Friedman/Nemenyi")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// YAML configuration file; built-in defaults when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Decode the CBOR logs of one batch into a run table with derived metrics
    Convert(ConvertArgs),

    /// Summarise one batch and export CSV tables and plots
    Analyse(AnalyseArgs),

    /// Rank all configured algorithms of one dimension
    Compare(CompareArgs),
}

/// Arguments for the convert command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ConvertArgs {
    /// Algorithm whose logs are converted
    #[arg(short, long, default_value = "PSO")]
    pub algorithm: String,

    /// Problem dimension label
    #[arg(short, long, default_value = "d10")]
    pub dimension: String,
}

/// Arguments for the analyse command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct AnalyseArgs {
    /// Algorithm whose run table is analysed
    #[arg(short, long, default_value = "PSO")]
    pub algorithm: String,

    /// Problem dimension label
    #[arg(short, long, default_value = "d10")]
    pub dimension: String,

    /// Skip rendering plots
    #[arg(long)]
    pub no_plots: bool,
}

/// Arguments for the compare command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct CompareArgs {
    /// Problem dimension label
    #[arg(short, long, default_value = "d10")]
    pub dimension: String,

    /// Skip rendering plots
    #[arg(long)]
    pub no_plots: bool,
}

/// Parse CLI arguments from an iterator
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_defaults() {
        let cli = parse_args(["analizar", "convert"]).unwrap();
        match cli.command {
            Command::Convert(args) => {
                assert_eq!(args.algorithm, "PSO");
                assert_eq!(args.dimension, "d10");
            }
            _ => panic!("Expected Convert command"),
        }
        assert!(!cli.verbose);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_parse_analyse_with_options() {
        let cli =
            parse_args(["analizar", "analyse", "-a", "SHADE", "-d", "d20", "--no-plots"]).unwrap();
        match cli.command {
            Command::Analyse(args) => {
                assert_eq!(args.algorithm, "SHADE");
                assert_eq!(args.dimension, "d20");
                assert!(args.no_plots);
            }
            _ => panic!("Expected Analyse command"),
        }
    }

    #[test]
    fn test_parse_compare_with_global_flags() {
        let cli = parse_args([
            "analizar",
            "compare",
            "--dimension",
            "d5",
            "--config",
            "analizar.yaml",
            "-q",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("analizar.yaml")));
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.dimension, "d5");
                assert!(!args.no_plots);
            }
            _ => panic!("Expected Compare command"),
        }
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(parse_args(["analizar", "train"]).is_err());
        assert!(parse_args(["analizar"]).is_err());
    }
}
