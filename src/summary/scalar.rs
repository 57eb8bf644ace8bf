//! Per-group summaries of one scalar per run.

use analizar_common::{AnalizarError, Result};

use super::group::group_runs;
use super::stats::{reduce_scalars, ScalarStats, Stat};
use crate::runs::{ConfigColumn, Label, Run, RunTable, ScalarColumn, StepColumn};

/// One group of a scalar summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarRow {
    pub key: Vec<Label>,
    pub retained: Vec<Label>,
    /// Last iteration of the group's first member.
    pub iterations_last: i64,
    /// Last evaluation of the group's first member.
    pub evaluations_last: i64,
    /// Reductions, parallel to `ScalarSummary::value_columns`.
    pub values: Vec<ScalarStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSummary {
    pub group_keys: Vec<ConfigColumn>,
    pub retained: Vec<ConfigColumn>,
    pub value_columns: Vec<ScalarColumn>,
    pub rows: Vec<ScalarRow>,
}

/// Column name of the last value of a step axis.
pub fn last_column(step: StepColumn) -> String {
    format!("{}_last", step.name())
}

impl ScalarSummary {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of a grouping key or retained column in `row`.
    pub fn label<'a>(&self, row: &'a ScalarRow, column: ConfigColumn) -> Option<&'a Label> {
        if let Some(i) = self.group_keys.iter().position(|&c| c == column) {
            return row.key.get(i);
        }
        self.retained.iter().position(|&c| c == column).and_then(|i| row.retained.get(i))
    }

    pub fn value(&self, row: &ScalarRow, column: ScalarColumn, stat: Stat) -> Option<f64> {
        let i = self.value_columns.iter().position(|&c| c == column)?;
        row.values.get(i).map(|s| s.get(stat))
    }

    /// Rows whose `column` equals `value`, same schema.
    pub fn filter(&self, column: ConfigColumn, value: &Label) -> Self {
        Self {
            group_keys: self.group_keys.clone(),
            retained: self.retained.clone(),
            value_columns: self.value_columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| self.label(row, column) == Some(value))
                .cloned()
                .collect(),
        }
    }

    /// Tag every row with `column = value`, as a retained column.
    pub fn with_label(mut self, column: ConfigColumn, value: Label) -> Self {
        if let Some(i) = self.group_keys.iter().position(|&c| c == column) {
            for row in &mut self.rows {
                row.key[i] = value.clone();
            }
        } else if let Some(i) = self.retained.iter().position(|&c| c == column) {
            for row in &mut self.rows {
                row.retained[i] = value.clone();
            }
        } else {
            self.retained.push(column);
            for row in &mut self.rows {
                row.retained.push(value.clone());
            }
        }
        self
    }

    /// Stack summaries sharing one schema.
    pub fn concat(parts: Vec<ScalarSummary>) -> Result<Self> {
        let mut parts = parts.into_iter();
        let Some(mut merged) = parts.next() else {
            return Err(AnalizarError::InsufficientData {
                test: "concat".into(),
                message: "no scalar summaries to combine".into(),
            });
        };
        for part in parts {
            if part.group_keys != merged.group_keys
                || part.retained != merged.retained
                || part.value_columns != merged.value_columns
            {
                return Err(AnalizarError::Storage {
                    context: "combining scalar summaries".into(),
                    message: format!(
                        "columns {:?} do not match {:?}",
                        part.column_names(),
                        merged.column_names()
                    ),
                });
            }
            merged.rows.extend(part.rows);
        }
        Ok(merged)
    }

    /// Persisted column names in row order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.group_keys.iter().chain(&self.retained).map(|c| c.name().to_string()).collect();
        names.extend(StepColumn::ALL.iter().map(|&s| last_column(s)));
        for column in &self.value_columns {
            names.extend(Stat::ALL.iter().map(|s| s.column(column.name())));
        }
        names
    }
}

fn last_step(run: &Run, step: StepColumn) -> Result<i64> {
    step.values(run).last().copied().ok_or_else(|| AnalizarError::EmptySeries {
        column: step.name().into(),
        key: run.config.clone(),
    })
}

/// Summarise scalar columns per observed combination of `group_keys`.
pub fn summarise_scalar(
    table: &RunTable,
    group_keys: &[ConfigColumn],
    value_columns: &[ScalarColumn],
    retained: &[ConfigColumn],
) -> Result<ScalarSummary> {
    let groups = group_runs(table, group_keys, retained)?;
    let mut rows = Vec::with_capacity(groups.len());

    for group in groups {
        let Some(first) = group.members.first() else {
            continue;
        };
        let iterations_last = last_step(first, StepColumn::Iterations)?;
        let evaluations_last = last_step(first, StepColumn::Evaluations)?;

        let values = value_columns
            .iter()
            .map(|&column| {
                let observed = group
                    .members
                    .iter()
                    .map(|run| column.value(run))
                    .collect::<Result<Vec<_>>>()?;
                Ok(reduce_scalars(&observed))
            })
            .collect::<Result<Vec<_>>>()?;

        rows.push(ScalarRow {
            key: group.key,
            retained: group.retained,
            iterations_last,
            evaluations_last,
            values,
        });
    }

    Ok(ScalarSummary {
        group_keys: group_keys.to_vec(),
        retained: retained.to_vec(),
        value_columns: value_columns.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::tests::sample_run;
    use approx::assert_relative_eq;

    fn table() -> RunTable {
        let cells = [
            ("1_PSO_f001_i01_d10", 1.0),
            ("2_PSO_f001_i01_d10", 3.0),
            ("1_PSO_f002_i01_d10", 5.0),
        ];
        let runs = cells
            .into_iter()
            .map(|(key, value)| {
                let mut run = sample_run(key);
                run.final_distance = Some(value);
                run.aocc = Some(value / 10.0);
                run
            })
            .collect();
        RunTable::new(runs)
    }

    #[test]
    fn test_summarise_scalar() {
        let summary = summarise_scalar(
            &table(),
            &[ConfigColumn::Function],
            &[ScalarColumn::FinalDistance, ScalarColumn::Aocc],
            &[ConfigColumn::Algorithm],
        )
        .unwrap();
        assert_eq!(summary.len(), 2);

        let first = &summary.rows[0];
        assert_eq!(first.iterations_last, 2);
        assert_eq!(first.evaluations_last, 30);
        assert_eq!(summary.value(first, ScalarColumn::FinalDistance, Stat::Mean), Some(2.0));
        assert_relative_eq!(
            summary.value(first, ScalarColumn::FinalDistance, Stat::Std).unwrap(),
            2.0f64.sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(summary.value(first, ScalarColumn::Aocc, Stat::Max).unwrap(), 0.3);

        let single = &summary.rows[1];
        assert!(summary.value(single, ScalarColumn::FinalDistance, Stat::Std).unwrap().is_nan());
    }

    #[test]
    fn test_summarise_scalar_requires_metrics() {
        let table = RunTable::new(vec![sample_run("1_PSO_f001_i01_d10")]);
        let err = summarise_scalar(&table, &[ConfigColumn::Function], &[ScalarColumn::Aocc], &[])
            .unwrap_err();
        assert!(matches!(err, AnalizarError::MissingDependency { .. }));
    }

    #[test]
    fn test_with_label_and_concat() {
        let by_function = [ConfigColumn::Function];
        let summary =
            summarise_scalar(&table(), &by_function, &[ScalarColumn::FinalDistance], &[]).unwrap();
        let pso = summary.clone().with_label(ConfigColumn::Dataset, Label::from("PSO_d10"));
        let shade = summary.with_label(ConfigColumn::Dataset, Label::from("SHADE_d10"));
        assert_eq!(pso.retained, vec![ConfigColumn::Dataset]);

        let merged = ScalarSummary::concat(vec![pso, shade]).unwrap();
        assert_eq!(merged.len(), 4);
        let dataset = merged.label(&merged.rows[3], ConfigColumn::Dataset);
        assert_eq!(dataset, Some(&Label::from("SHADE_d10")));
        assert_eq!(merged.column_names()[..4], [
            "Function".to_string(),
            "Dataset".into(),
            "Iterations_last".into(),
            "Evaluations_last".into()
        ]);
    }

    #[test]
    fn test_filter_keeps_schema() {
        let summary = summarise_scalar(
            &table(),
            &[ConfigColumn::Function, ConfigColumn::Instance],
            &[ScalarColumn::Aocc],
            &[ConfigColumn::Algorithm],
        )
        .unwrap();
        let f002 = summary.filter(ConfigColumn::Function, &Label::from("f002"));
        assert_eq!(f002.len(), 1);
        assert_eq!(f002.group_keys, summary.group_keys);
        assert!(summary.filter(ConfigColumn::Algorithm, &Label::from("SHADE")).is_empty());
    }

    #[test]
    fn test_concat_rejects_mismatched_schema() {
        let a = summarise_scalar(&table(), &[ConfigColumn::Function], &[ScalarColumn::Aocc], &[])
            .unwrap();
        let b = summarise_scalar(&table(), &[ConfigColumn::Instance], &[ScalarColumn::Aocc], &[])
            .unwrap();
        assert!(matches!(ScalarSummary::concat(vec![a, b]), Err(AnalizarError::Storage { .. })));
        assert!(ScalarSummary::concat(Vec::new()).is_err());
    }
}
