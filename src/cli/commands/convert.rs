//! Convert command: CBOR logs to a run table with derived metrics.

use analizar_common::{AnalizarError, Result};

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{AnalysisConfig, ConvertArgs};
use crate::io::{read_log_dir, write_run_table};
use crate::layout::Layout;
use crate::metrics::{add_distance_to_optimum, add_final_aocc, add_final_distance, OptimaReference};
use crate::runs::{build_run_table, RunTable};

pub fn run_convert(args: ConvertArgs, config: &AnalysisConfig, level: LogLevel) -> Result<()> {
    convert_batch(config, &args.algorithm, &args.dimension, level).map(|_| ())
}

/// Build, enrich and persist the run table of one algorithm/dimension batch.
pub fn convert_batch(
    config: &AnalysisConfig,
    algorithm: &str,
    dimension: &str,
    level: LogLevel,
) -> Result<RunTable> {
    let layout = Layout::new(&config.paths);
    let dataset = Layout::dataset(algorithm, dimension);
    let dir = layout.log_dir(algorithm, dimension);

    log(level, LogLevel::Normal, &format!("Converting {dataset} logs from {}", dir.display()));
    let logs = read_log_dir(&dir, config.ingest.workers, &config.ingest.run_prefixes)?;
    if logs.is_empty() {
        return Err(AnalizarError::InsufficientData {
            test: "conversion".into(),
            message: format!("no logs found in {}", dir.display()),
        });
    }
    log(level, LogLevel::Verbose, &format!("  Decoded {} logs", logs.len()));

    let mut table = build_run_table(&logs, algorithm, dimension, &config.ingest.columns)?;

    let optima_path = layout.optima_path();
    let reference = OptimaReference::from_csv(&optima_path)?;
    log(
        level,
        LogLevel::Verbose,
        &format!("  Loaded {} reference optima from {}", reference.len(), optima_path.display()),
    );
    add_distance_to_optimum(&mut table, &reference, config.metrics.functions.as_deref())?;
    add_final_distance(&mut table)?;
    add_final_aocc(&mut table, config.metrics.aocc)?;

    let path = layout.full_table(&dataset);
    write_run_table(&path, &table)?;
    log(level, LogLevel::Normal, &format!("Wrote {} runs to {}", table.len(), path.display()));
    Ok(table)
}
