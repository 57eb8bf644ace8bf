//! Run table: one row per optimisation run.

mod builder;
mod columns;
mod groups;

pub use builder::{build_run_table, correct_iterations, parse_run_key, LogColumns, RunKey};
pub use columns::{ConfigColumn, Label, ScalarColumn, SeriesColumn, StepColumn};
pub use groups::FunctionGroup;

use std::collections::BTreeMap;

use analizar_common::{AnalizarError, Result};

/// One optimisation run with its logged and derived trajectories.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Raw run key, e.g. `3_PSO_f001_i01_d10`.
    pub config: String,
    /// `{algorithm}_{dimension}` discriminator of the batch the run belongs to.
    pub dataset: String,
    pub algorithm: String,
    pub run: i64,
    pub function: String,
    pub instance: String,
    pub dimension: String,
    pub group: FunctionGroup,
    /// Step axis: iteration counter (already corrected).
    pub iterations: Vec<i64>,
    /// Step axis: evaluation counter.
    pub evaluations: Vec<i64>,
    pub best_objective: Vec<f64>,
    pub min_individual_distance: Vec<f64>,
    pub distance_to_optimum: Option<Vec<f64>>,
    pub final_distance: Option<f64>,
    pub aocc: Option<f64>,
}

impl Run {
    /// Number of logged steps.
    pub fn steps(&self) -> usize {
        self.evaluations.len()
    }

    /// Verify that every trajectory matches the step axis length.
    pub fn check_lengths(&self) -> Result<()> {
        let expected = self.steps();
        let lengths = [
            (StepColumn::Iterations.name(), self.iterations.len()),
            (SeriesColumn::BestObjectiveValue.name(), self.best_objective.len()),
            (SeriesColumn::MinimumIndividualDistance.name(), self.min_individual_distance.len()),
            (
                SeriesColumn::DistanceToOptimum.name(),
                self.distance_to_optimum.as_ref().map_or(expected, Vec::len),
            ),
        ];
        for (column, actual) in lengths {
            if actual != expected {
                return Err(AnalizarError::LengthMismatch {
                    key: self.config.clone(),
                    column: column.into(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Ordered collection of runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTable {
    runs: Vec<Run>,
}

impl RunTable {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Run> {
        self.runs.iter()
    }

    /// Runs whose `column` equals `value`.
    pub fn filter(&self, column: ConfigColumn, value: &Label) -> RunTable {
        Self::new(self.runs.iter().filter(|r| &column.value(r) == value).cloned().collect())
    }

    /// Split into one table per observed value of `column`, ordered by value.
    pub fn partition(&self, column: ConfigColumn) -> BTreeMap<Label, RunTable> {
        let mut parts: BTreeMap<Label, RunTable> = BTreeMap::new();
        for run in &self.runs {
            parts.entry(column.value(run)).or_default().runs.push(run.clone());
        }
        parts
    }

    /// Observed values of `column`, sorted and deduplicated.
    pub fn distinct(&self, column: ConfigColumn) -> Vec<Label> {
        let mut values: Vec<Label> = self.runs.iter().map(|r| column.value(r)).collect();
        values.sort();
        values.dedup();
        values
    }
}

impl<'a> IntoIterator for &'a RunTable {
    type Item = &'a Run;
    type IntoIter = std::slice::Iter<'a, Run>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}
