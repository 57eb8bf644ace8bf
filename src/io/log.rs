//! Per-run CBOR log decoding.
//!
//! A log is a CBOR map with a `names` array (the column dictionary) and an
//! `entries` array; each entry maps a column index to the value logged at
//! that step. Decoding keeps the dictionary order as the column order.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use analizar_common::{AnalizarError, Result};
use ciborium::value::Value;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Extension of run log files.
pub const LOG_EXTENSION: &str = "cbor";

#[derive(Serialize, Deserialize)]
struct RawLog {
    names: Vec<String>,
    entries: Vec<BTreeMap<usize, Value>>,
}

/// Decoded log: named numeric columns, one cell per logged entry.
///
/// Cells are `None` where an entry did not log the column or logged a
/// non-numeric value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogTable {
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl LogTable {
    /// Build a table from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<Option<f64>>)>) -> Self {
        let (names, columns) = columns.into_iter().unzip();
        Self { names, columns }
    }

    /// Column names in dictionary order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of logged entries.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells of a column by name.
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.names.iter().position(|n| n == name).map(|i| self.columns[i].as_slice())
    }

    fn from_raw(raw: RawLog, path: &Path) -> Result<Self> {
        let mut columns = vec![Vec::with_capacity(raw.entries.len()); raw.names.len()];
        for (row, entry) in raw.entries.iter().enumerate() {
            if let Some((&key, _)) = entry.range(raw.names.len()..).next() {
                return Err(AnalizarError::Decode {
                    path: path.to_path_buf(),
                    message: format!(
                        "entry {row} uses column index {key} outside the name dictionary"
                    ),
                });
            }
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(entry.get(&idx).and_then(numeric));
            }
        }
        Ok(Self { names: raw.names, columns })
    }

    fn to_raw(&self) -> RawLog {
        let entries = (0..self.len())
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, column)| column[row].map(|v| (idx, Value::Float(v))))
                    .collect()
            })
            .collect();
        RawLog { names: self.names.clone(), entries }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(i128::from(*i) as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Decode one log file.
pub fn decode_log(path: &Path) -> Result<LogTable> {
    let file = File::open(path)
        .map_err(|e| AnalizarError::io(format!("opening log {}", path.display()), e))?;
    let raw: RawLog = ciborium::de::from_reader(BufReader::new(file)).map_err(|e| {
        AnalizarError::Decode { path: path.to_path_buf(), message: e.to_string() }
    })?;
    LogTable::from_raw(raw, path)
}

/// Encode a table in the log format.
pub fn write_log(path: &Path, table: &LogTable) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| AnalizarError::io(format!("creating log {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    ciborium::ser::into_writer(&table.to_raw(), &mut writer)
        .map_err(|e| AnalizarError::Serialization { message: e.to_string() })?;
    writer.flush().map_err(|e| AnalizarError::io(format!("writing log {}", path.display()), e))
}

/// Log files of a directory, sorted by name.
///
/// When `prefixes` is non-empty only files whose name starts with one of
/// them are listed.
pub fn list_logs(dir: &Path, prefixes: &[String]) -> Result<Vec<PathBuf>> {
    let context = || format!("listing logs in {}", dir.display());
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| AnalizarError::io(context(), e))? {
        let path = entry.map_err(|e| AnalizarError::io(context(), e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if prefixes.is_empty() || prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Decode every log of a directory on a pool of `workers` threads
/// (`0` = one per core), keyed by file stem.
///
/// The first failing file aborts the whole batch.
pub fn read_log_dir(
    dir: &Path,
    workers: usize,
    prefixes: &[String],
) -> Result<BTreeMap<String, LogTable>> {
    let paths = list_logs(dir, prefixes)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| AnalizarError::Internal { message: format!("worker pool: {e}") })?;

    let decoded = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or_else(|| AnalizarError::Decode {
                        path: path.clone(),
                        message: "file name is not valid UTF-8".into(),
                    })?
                    .to_string();
                Ok((stem, decode_log(path)?))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    Ok(decoded.into_iter().collect())
}
