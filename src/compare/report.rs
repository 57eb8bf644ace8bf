//! Comparison report artifact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use analizar_common::{AnalizarError, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::ComparisonScope;

/// Result of one comparison scope, serialised as a flat JSON object.
///
/// The post-hoc fields are absent when the post-hoc analysis was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    #[serde(rename = "Scope")]
    pub scope: String,
    #[serde(rename = "Friedman statistic")]
    pub statistic: f64,
    #[serde(rename = "Friedman pvalue")]
    pub p_value: f64,
    #[serde(rename = "Significant")]
    pub significant: bool,
    /// Mean fractional rank per treatment; lower is better.
    #[serde(rename = "Average ranks", default, skip_serializing_if = "Option::is_none")]
    pub average_ranks: Option<BTreeMap<String, f64>>,
    /// Nemenyi p-values keyed by column treatment, then row treatment.
    #[serde(rename = "Nemenyi Friedman", default, skip_serializing_if = "Option::is_none")]
    pub nemenyi: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    #[serde(rename = "Generated at")]
    pub generated_at: String,
}

impl ComparisonReport {
    pub fn new(scope: &ComparisonScope, statistic: f64, p_value: f64, significant: bool) -> Self {
        Self {
            scope: scope.to_string(),
            statistic,
            p_value,
            significant,
            average_ranks: None,
            nemenyi: None,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Treatments with their average rank, best first, if the post-hoc
    /// analysis ran.
    pub fn ranking(&self) -> Option<Vec<(String, f64)>> {
        let ranks = self.average_ranks.as_ref()?;
        let mut ordered: Vec<(String, f64)> = ranks.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1));
        Some(ordered)
    }

    /// Nemenyi p-value between two treatments.
    pub fn p_value_between(&self, a: &str, b: &str) -> Option<f64> {
        self.nemenyi.as_ref()?.get(a)?.get(b).copied()
    }
}

/// Write `report` as pretty JSON, creating parent directories.
pub fn write_json(report: &ComparisonReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AnalizarError::io(format!("creating {}", parent.display()), e))?;
    }
    let file = File::create(path)
        .map_err(|e| AnalizarError::io(format!("creating report {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| AnalizarError::Serialization { message: e.to_string() })?;
    writer.flush().map_err(|e| AnalizarError::io(format!("writing report {}", path.display()), e))
}

pub fn read_json(path: &Path) -> Result<ComparisonReport> {
    let file = File::open(path)
        .map_err(|e| AnalizarError::io(format!("opening report {}", path.display()), e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AnalizarError::Serialization { message: e.to_string() })
}
