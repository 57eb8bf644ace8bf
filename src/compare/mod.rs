//! Cross-algorithm statistical comparison.
//!
//! Scalar summaries of several algorithms are arranged into a
//! blocks × treatments matrix and tested with Friedman, followed by
//! fractional ranks and Nemenyi p-values when the post-hoc policy allows.

mod report;

pub use report::{read_json, write_json, ComparisonReport};

use std::collections::BTreeMap;
use std::fmt;

use analizar_common::{AnalizarError, Result};
use analizar_stats::{fractional_ranks, friedman, nemenyi};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::runs::{ConfigColumn, Label, ScalarColumn};
use crate::summary::{ScalarSummary, Stat};

/// Blocks × treatments matrix of one summary statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMatrix {
    pub blocks: Vec<Label>,
    pub treatments: Vec<Label>,
    pub values: Array2<f64>,
}

impl ComparisonMatrix {
    /// Pick `value` for every (block, treatment) pair from `summary`.
    ///
    /// Each pair must match exactly one summary row.
    pub fn build(
        summary: &ScalarSummary,
        block_column: ConfigColumn,
        treatment_column: ConfigColumn,
        blocks: &[Label],
        treatments: &[Label],
        value: (ScalarColumn, Stat),
    ) -> Result<Self> {
        let (column, stat) = value;
        if !summary.value_columns.contains(&column) {
            return Err(AnalizarError::ConfigValue {
                field: "comparison.value".into(),
                message: format!("summary has no {} column", stat.column(column.name())),
                suggestion: format!("Summarise {column} before comparing"),
            });
        }

        let mut values = Array2::from_elem((blocks.len(), treatments.len()), f64::NAN);
        for (i, block) in blocks.iter().enumerate() {
            for (j, treatment) in treatments.iter().enumerate() {
                let matching: Vec<f64> = summary
                    .rows
                    .iter()
                    .filter(|row| {
                        summary.label(row, block_column) == Some(block)
                            && summary.label(row, treatment_column) == Some(treatment)
                    })
                    .filter_map(|row| summary.value(row, column, stat))
                    .collect();
                match matching.as_slice() {
                    [only] => values[[i, j]] = *only,
                    found => {
                        return Err(AnalizarError::MissingCombination {
                            treatment: treatment.to_string(),
                            block: block.to_string(),
                            found: found.len(),
                        })
                    }
                }
            }
        }

        Ok(Self { blocks: blocks.to_vec(), treatments: treatments.to_vec(), values })
    }
}

/// What the blocks of a comparison are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonScope {
    /// Blocks are benchmark functions.
    Global,
    /// Blocks are the instances of one function.
    Function(String),
}

impl fmt::Display for ComparisonScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Function(id) => f.write_str(id),
        }
    }
}

/// When to compute ranks and Nemenyi p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostHocPolicy {
    Always,
    #[default]
    WhenSignificant,
}

/// Run Friedman on `matrix` and, per `policy`, the post-hoc analysis.
pub fn compare(
    matrix: &ComparisonMatrix,
    scope: &ComparisonScope,
    policy: PostHocPolicy,
    alpha: f64,
) -> Result<ComparisonReport> {
    let result = friedman(matrix.values.view())?;
    let significant = result.is_significant(alpha);

    let mut report = ComparisonReport::new(scope, result.statistic, result.p_value, significant);
    if policy == PostHocPolicy::Always || significant {
        let names: Vec<String> = matrix.treatments.iter().map(Label::to_string).collect();
        let ranks = fractional_ranks(matrix.values.view());
        let p_values = nemenyi(matrix.values.view())?;

        report.average_ranks = Some(names.iter().cloned().zip(ranks).collect());
        report.nemenyi = Some(
            names
                .iter()
                .enumerate()
                .map(|(j, column)| {
                    let cells: BTreeMap<String, f64> = names
                        .iter()
                        .enumerate()
                        .map(|(i, row)| (row.clone(), p_values[[i, j]]))
                        .collect();
                    (column.clone(), cells)
                })
                .collect(),
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{ScalarRow, ScalarStats};

    /// Scalar summary keyed by (Function, Algorithm) with FinalDistance means.
    fn summary(cells: &[(&str, &str, f64)]) -> ScalarSummary {
        ScalarSummary {
            group_keys: vec![ConfigColumn::Function],
            retained: vec![ConfigColumn::Algorithm],
            value_columns: vec![ScalarColumn::FinalDistance],
            rows: cells
                .iter()
                .map(|&(function, algorithm, mean)| ScalarRow {
                    key: vec![Label::from(function)],
                    retained: vec![Label::from(algorithm)],
                    iterations_last: 10,
                    evaluations_last: 100,
                    values: vec![ScalarStats { mean, ..ScalarStats::default() }],
                })
                .collect(),
        }
    }

    fn labels(values: &[&str]) -> Vec<Label> {
        values.iter().map(|&v| Label::from(v)).collect()
    }

    fn dominant() -> (ScalarSummary, Vec<Label>, Vec<Label>) {
        let functions: Vec<String> = (1..=24).map(|i| format!("f{i:03}")).collect();
        let mut cells = Vec::new();
        for (i, f) in functions.iter().enumerate() {
            let offset = i as f64;
            cells.push((f.as_str(), "A", 1.0 + offset));
            cells.push((f.as_str(), "B", 2.0 + offset + (i % 2) as f64));
            cells.push((f.as_str(), "C", 3.0 + offset - (i % 2) as f64));
        }
        let s = summary(&cells);
        let blocks = functions.iter().map(|f| Label::from(f.as_str())).collect();
        (s, blocks, labels(&["A", "B", "C"]))
    }

    #[test]
    fn test_dominant_algorithm_is_significant() {
        let (s, blocks, treatments) = dominant();
        let matrix = ComparisonMatrix::build(
            &s,
            ConfigColumn::Function,
            ConfigColumn::Algorithm,
            &blocks,
            &treatments,
            (ScalarColumn::FinalDistance, Stat::Mean),
        )
        .unwrap();
        assert_eq!(matrix.values.dim(), (24, 3));

        let policy = PostHocPolicy::WhenSignificant;
        let report = compare(&matrix, &ComparisonScope::Global, policy, 0.05).unwrap();
        assert!(report.significant);
        assert!(report.p_value < 0.05);
        assert_eq!(report.scope, "global");

        let ranks = report.average_ranks.as_ref().unwrap();
        assert!(ranks["A"] < ranks["B"] && ranks["A"] < ranks["C"]);
        let p = report.nemenyi.as_ref().unwrap();
        assert_eq!(p["A"]["A"], 1.0);
        assert_eq!(p["A"]["B"], p["B"]["A"]);
        assert!(p["A"]["B"] < 0.05);
    }

    #[test]
    fn test_missing_combination_names_labels() {
        let s = summary(&[("f001", "A", 1.0), ("f001", "B", 2.0), ("f002", "A", 1.0)]);
        let err = ComparisonMatrix::build(
            &s,
            ConfigColumn::Function,
            ConfigColumn::Algorithm,
            &labels(&["f001", "f002"]),
            &labels(&["A", "B"]),
            (ScalarColumn::FinalDistance, Stat::Mean),
        )
        .unwrap_err();
        match err {
            AnalizarError::MissingCombination { treatment, block, found } => {
                assert_eq!((treatment.as_str(), block.as_str(), found), ("B", "f002", 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_combination_fails() {
        let s = summary(&[("f001", "A", 1.0), ("f001", "A", 2.0)]);
        let err = ComparisonMatrix::build(
            &s,
            ConfigColumn::Function,
            ConfigColumn::Algorithm,
            &labels(&["f001"]),
            &labels(&["A"]),
            (ScalarColumn::FinalDistance, Stat::Mean),
        )
        .unwrap_err();
        assert!(matches!(err, AnalizarError::MissingCombination { found: 2, .. }));
    }

    #[test]
    fn test_post_hoc_skipped_when_not_significant() {
        let s = summary(&[
            ("f001", "A", 1.0),
            ("f001", "B", 2.0),
            ("f001", "C", 3.0),
            ("f002", "A", 3.0),
            ("f002", "B", 2.0),
            ("f002", "C", 1.0),
        ]);
        let matrix = ComparisonMatrix::build(
            &s,
            ConfigColumn::Function,
            ConfigColumn::Algorithm,
            &labels(&["f001", "f002"]),
            &labels(&["A", "B", "C"]),
            (ScalarColumn::FinalDistance, Stat::Mean),
        )
        .unwrap();

        let scope = ComparisonScope::Function("f001".into());
        let skipped = compare(&matrix, &scope, PostHocPolicy::WhenSignificant, 0.05).unwrap();
        assert!(!skipped.significant);
        assert!(skipped.average_ranks.is_none() && skipped.nemenyi.is_none());

        let forced = compare(&matrix, &scope, PostHocPolicy::Always, 0.05).unwrap();
        assert_eq!(forced.average_ranks.unwrap().len(), 3);
    }

    #[test]
    fn test_two_treatments_is_insufficient() {
        let s = summary(&[("f001", "A", 1.0), ("f001", "B", 2.0)]);
        let matrix = ComparisonMatrix::build(
            &s,
            ConfigColumn::Function,
            ConfigColumn::Algorithm,
            &labels(&["f001"]),
            &labels(&["A", "B"]),
            (ScalarColumn::FinalDistance, Stat::Mean),
        )
        .unwrap();
        assert!(matches!(
            compare(&matrix, &ComparisonScope::Global, PostHocPolicy::Always, 0.05),
            Err(AnalizarError::InsufficientData { .. })
        ));
    }
}
