//! Pointwise summaries of per-run trajectories.

use analizar_common::{AnalizarError, Result};
use ndarray::Array2;

use super::group::group_runs;
use super::stats::{reduce_columns, SeriesStats, Stat};
use crate::runs::{ConfigColumn, Label, Run, RunTable, SeriesColumn, StepColumn};

/// One group of a process summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    /// Values of the grouping keys, parallel to `ProcessSummary::group_keys`.
    pub key: Vec<Label>,
    /// Values of the retained columns, parallel to `ProcessSummary::retained`.
    pub retained: Vec<Label>,
    /// Step axis of the group's first member.
    pub steps: Vec<i64>,
    /// Reductions, parallel to `ProcessSummary::value_columns`.
    pub values: Vec<SeriesStats>,
}

/// Per-group, per-step summaries of value trajectories.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummary {
    pub group_keys: Vec<ConfigColumn>,
    pub retained: Vec<ConfigColumn>,
    pub step_column: StepColumn,
    pub value_columns: Vec<SeriesColumn>,
    pub rows: Vec<ProcessRow>,
}

impl ProcessSummary {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of a grouping key or retained column in `row`.
    pub fn label<'a>(&self, row: &'a ProcessRow, column: ConfigColumn) -> Option<&'a Label> {
        if let Some(i) = self.group_keys.iter().position(|&c| c == column) {
            return row.key.get(i);
        }
        self.retained.iter().position(|&c| c == column).and_then(|i| row.retained.get(i))
    }

    /// One reduced trajectory of `row`.
    pub fn series<'a>(
        &self,
        row: &'a ProcessRow,
        column: SeriesColumn,
        stat: Stat,
    ) -> Option<&'a [f64]> {
        let i = self.value_columns.iter().position(|&c| c == column)?;
        row.values.get(i).map(|s| s.get(stat))
    }

    /// Persisted column names in row order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.group_keys.iter().chain(&self.retained).map(|c| c.name().to_string()).collect();
        names.push(self.step_column.name().to_string());
        for column in &self.value_columns {
            names.extend(Stat::ALL.iter().map(|s| s.column(column.name())));
        }
        names
    }
}

fn stack(
    members: &[&Run],
    column: SeriesColumn,
    steps: usize,
    group: &str,
) -> Result<Array2<f64>> {
    let mut flat = Vec::with_capacity(members.len() * steps);
    for run in members {
        let values = column.values(run)?;
        if values.len() != steps {
            return Err(AnalizarError::RaggedGroup {
                column: column.name().into(),
                group: group.into(),
                expected: steps,
                actual: values.len(),
            });
        }
        flat.extend_from_slice(values);
    }
    Array2::from_shape_vec((members.len(), steps), flat)
        .map_err(|e| AnalizarError::Internal { message: format!("stacking {column}: {e}") })
}

/// Summarise value trajectories per observed combination of `group_keys`.
///
/// Every member of a group must have trajectories as long as the first
/// member's step axis, and every `retained` column must be constant within
/// the group.
pub fn summarise_process(
    table: &RunTable,
    group_keys: &[ConfigColumn],
    value_columns: &[SeriesColumn],
    step_column: StepColumn,
    retained: &[ConfigColumn],
) -> Result<ProcessSummary> {
    let groups = group_runs(table, group_keys, retained)?;
    let mut rows = Vec::with_capacity(groups.len());

    for group in groups {
        let steps =
            group.members.first().map(|r| step_column.values(r).to_vec()).unwrap_or_default();
        let values = value_columns
            .iter()
            .map(|&column| {
                stack(&group.members, column, steps.len(), &group.description)
                    .map(|s| reduce_columns(s.view()))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(ProcessRow { key: group.key, retained: group.retained, steps, values });
    }

    Ok(ProcessSummary {
        group_keys: group_keys.to_vec(),
        retained: retained.to_vec(),
        step_column,
        value_columns: value_columns.to_vec(),
        rows,
    })
}
