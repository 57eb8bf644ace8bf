//! Human-readable CSV export of scalar summaries.

use std::fs::{self, File};
use std::path::Path;

use analizar_common::{AnalizarError, Result};

use crate::summary::{ScalarSummary, Stat};

fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Write `summary` with one header row; NaN cells are left empty.
pub fn write_scalar_csv(path: &Path, summary: &ScalarSummary) -> Result<()> {
    let context = || format!("exporting {}", path.display());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AnalizarError::io(format!("creating {}", parent.display()), e))?;
    }
    let file = File::create(path).map_err(|e| AnalizarError::io(context(), e))?;
    let mut writer = csv::WriterBuilder::new().from_writer(file);

    writer.write_record(summary.column_names()).map_err(|e| AnalizarError::storage(context(), e))?;
    for row in &summary.rows {
        let mut record: Vec<String> =
            row.key.iter().chain(&row.retained).map(ToString::to_string).collect();
        record.push(row.iterations_last.to_string());
        record.push(row.evaluations_last.to_string());
        for stats in &row.values {
            record.extend(Stat::ALL.iter().map(|&s| cell(stats.get(s))));
        }
        writer.write_record(&record).map_err(|e| AnalizarError::storage(context(), e))?;
    }
    writer.flush().map_err(|e| AnalizarError::io(context(), e))
}
