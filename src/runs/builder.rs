//! Assemble decoded logs into a run table.

use std::collections::BTreeMap;

use analizar_common::{AnalizarError, Result};
use serde::{Deserialize, Serialize};

use super::{FunctionGroup, Run, RunTable};
use crate::io::LogTable;

/// Names of the logged columns the run table is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogColumns {
    #[serde(default = "default_iterations")]
    pub iterations: String,
    #[serde(default = "default_evaluations")]
    pub evaluations: String,
    #[serde(default = "default_objective")]
    pub objective: String,
    #[serde(default = "default_diversity")]
    pub diversity: String,
}

fn default_iterations() -> String {
    "mahf::state::common::Iterations".into()
}

fn default_evaluations() -> String {
    "mahf::state::common::Evaluations".into()
}

fn default_objective() -> String {
    "BestObjectiveValue".into()
}

fn default_diversity() -> String {
    "mahf::components::measures::diversity::MinimumIndividualDistance".into()
}

impl Default for LogColumns {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            evaluations: default_evaluations(),
            objective: default_objective(),
            diversity: default_diversity(),
        }
    }
}

/// Fields encoded in a run key `{run}_{unused}_{function}_{instance}_{dimension}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunKey {
    pub run: i64,
    pub function: String,
    pub instance: String,
    pub dimension: String,
}

/// Parse a run key into its positional fields.
pub fn parse_run_key(key: &str) -> Result<RunKey> {
    let malformed = |reason: String| AnalizarError::MalformedKey { key: key.to_string(), reason };

    let fields: Vec<&str> = key.split('_').collect();
    if fields.len() != 5 {
        return Err(malformed(format!("found {} fields", fields.len())));
    }
    if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
        return Err(malformed(format!("field {} is empty", pos + 1)));
    }
    let run = fields[0]
        .parse::<i64>()
        .map_err(|_| malformed(format!("run index '{}' is not an integer", fields[0])))?;

    Ok(RunKey {
        run,
        function: fields[2].to_string(),
        instance: fields[3].to_string(),
        dimension: fields[4].to_string(),
    })
}

/// Undo the logging quirk where the iteration counter restarts at the
/// second entry: the first value is kept, every later value gains one.
pub fn correct_iterations(raw: &[i64]) -> Vec<i64> {
    raw.iter().enumerate().map(|(i, &v)| if i == 0 { v } else { v + 1 }).collect()
}

fn column<'a>(log: &'a LogTable, name: &str, key: &str) -> Result<&'a [Option<f64>]> {
    log.column(name)
        .ok_or_else(|| AnalizarError::MissingLogColumn { column: name.into(), key: key.into() })
}

fn integers(log: &LogTable, name: &str, key: &str) -> Result<Vec<i64>> {
    column(log, name, key)?
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let value = cell.ok_or_else(|| AnalizarError::MissingValue {
                column: name.into(),
                key: key.into(),
                index,
            })?;
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(AnalizarError::NonIntegerValue {
                    column: name.into(),
                    key: key.into(),
                    index,
                    value,
                });
            }
            Ok(value as i64)
        })
        .collect()
}

fn floats(log: &LogTable, name: &str, key: &str) -> Result<Vec<f64>> {
    Ok(column(log, name, key)?.iter().map(|cell| cell.unwrap_or(f64::NAN)).collect())
}

/// Build the run table for one algorithm/dimension batch.
///
/// Runs are ordered by key. The first malformed key, unknown function or
/// missing column aborts the build.
pub fn build_run_table(
    logs: &BTreeMap<String, LogTable>,
    algorithm: &str,
    dimension_label: &str,
    columns: &LogColumns,
) -> Result<RunTable> {
    let dataset = format!("{algorithm}_{dimension_label}");
    let mut runs = Vec::with_capacity(logs.len());

    for (key, log) in logs {
        let parsed = parse_run_key(key)?;
        let group = FunctionGroup::of(&parsed.function).ok_or_else(|| {
            AnalizarError::UnknownFunction { function: parsed.function.clone(), key: key.clone() }
        })?;

        let run = Run {
            config: key.clone(),
            dataset: dataset.clone(),
            algorithm: algorithm.to_string(),
            run: parsed.run,
            function: parsed.function,
            instance: parsed.instance,
            dimension: parsed.dimension,
            group,
            iterations: correct_iterations(&integers(log, &columns.iterations, key)?),
            evaluations: integers(log, &columns.evaluations, key)?,
            best_objective: floats(log, &columns.objective, key)?,
            min_individual_distance: floats(log, &columns.diversity, key)?,
            distance_to_optimum: None,
            final_distance: None,
            aocc: None,
        };
        run.check_lengths()?;
        runs.push(run);
    }

    Ok(RunTable::new(runs))
}
