//! Columnar persistence of run tables and summaries.
//!
//! Tables are written as Arrow IPC files (Feather v2). Categorical columns
//! are Utf8 except `Run` (Int64), trajectories are lists, and derived
//! columns are nullable. Summary files carry their schema in the Arrow
//! metadata so a reload rebuilds the typed summary exactly.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use analizar_common::{AnalizarError, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, ListArray, StringArray};
use arrow::datatypes::{Field, Float64Type, Int64Type, Schema, SchemaRef};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;

use crate::runs::{
    ConfigColumn, FunctionGroup, Label, Run, RunTable, ScalarColumn, SeriesColumn, StepColumn,
};
use crate::summary::{
    last_column, ProcessRow, ProcessSummary, ScalarRow, ScalarStats, ScalarSummary, SeriesStats,
    Stat,
};

const KIND: &str = "analizar.kind";
const GROUP_KEYS: &str = "analizar.group_keys";
const RETAINED: &str = "analizar.retained";
const STEP: &str = "analizar.step";
const VALUES: &str = "analizar.values";

const CONFIG: &str = "Config";
const FINAL_DISTANCE: &str = "FinalDistance";
const AOCC: &str = "AOCC";

// Array builders

fn strings<'a>(values: impl IntoIterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn labels<'a>(column: ConfigColumn, values: impl Iterator<Item = &'a Label>) -> ArrayRef {
    if column.is_integer() {
        Arc::new(Int64Array::from_iter(values.map(|l| match l {
            Label::Integer(v) => Some(*v),
            Label::Text(s) => s.parse().ok(),
        })))
    } else {
        let text: Vec<String> = values.map(Label::to_string).collect();
        Arc::new(StringArray::from_iter_values(text))
    }
}

fn int_lists<'a>(values: impl Iterator<Item = &'a [i64]>) -> ArrayRef {
    Arc::new(ListArray::from_iter_primitive::<Int64Type, _, _>(
        values.map(|v| Some(v.iter().copied().map(Some))),
    ))
}

fn float_lists<'a>(values: impl Iterator<Item = Option<&'a [f64]>>) -> ArrayRef {
    Arc::new(ListArray::from_iter_primitive::<Float64Type, _, _>(
        values.map(|v| v.map(|s| s.iter().copied().map(Some))),
    ))
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items.into_iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

fn write_table(
    path: &Path,
    columns: Vec<(String, ArrayRef)>,
    metadata: HashMap<String, String>,
) -> Result<()> {
    let context = || format!("writing {}", path.display());
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(name, array.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields).with_metadata(metadata));
    let batch = RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
        .map_err(|e| AnalizarError::storage(context(), e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AnalizarError::io(format!("creating {}", parent.display()), e))?;
    }
    // The table only appears at its final path once fully written
    let partial = PathBuf::from(format!("{}.partial", path.display()));
    let file = File::create(&partial).map_err(|e| AnalizarError::io(context(), e))?;
    let mut writer = FileWriter::try_new(BufWriter::new(file), &schema)
        .map_err(|e| AnalizarError::storage(context(), e))?;
    writer.write(&batch).map_err(|e| AnalizarError::storage(context(), e))?;
    writer.finish().map_err(|e| AnalizarError::storage(context(), e))?;
    writer
        .into_inner()
        .map_err(|e| AnalizarError::storage(context(), e))?
        .flush()
        .map_err(|e| AnalizarError::io(context(), e))?;
    fs::rename(&partial, path).map_err(|e| AnalizarError::io(context(), e))
}

// Array readers

struct Table {
    path: PathBuf,
    schema: SchemaRef,
    batch: RecordBatch,
}

fn read_table(path: &Path) -> Result<Table> {
    let context = || format!("reading {}", path.display());
    let file = File::open(path).map_err(|e| AnalizarError::io(context(), e))?;
    let reader = FileReader::try_new(BufReader::new(file), None)
        .map_err(|e| AnalizarError::storage(context(), e))?;
    let schema = reader.schema();
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AnalizarError::storage(context(), e))?;
    let batch = arrow::compute::concat_batches(&schema, &batches)
        .map_err(|e| AnalizarError::storage(context(), e))?;
    Ok(Table { path: path.to_path_buf(), schema, batch })
}

impl Table {
    fn error(&self, message: impl ToString) -> AnalizarError {
        AnalizarError::storage(format!("reading {}", self.path.display()), message)
    }

    fn rows(&self) -> usize {
        self.batch.num_rows()
    }

    fn metadata(&self, key: &str) -> Result<&str> {
        self.schema
            .metadata()
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| self.error(format!("schema metadata has no '{key}' entry")))
    }

    fn metadata_list<T: FromStr<Err = AnalizarError>>(&self, key: &str) -> Result<Vec<T>> {
        self.metadata(key)?.split(',').filter(|s| !s.is_empty()).map(str::parse).collect()
    }

    fn expect_kind(&self, kind: &str) -> Result<()> {
        let found = self.metadata(KIND)?;
        if found != kind {
            return Err(self.error(format!("expected a {kind} table, found {found}")));
        }
        Ok(())
    }

    fn column<T: Array + 'static>(&self, name: &str) -> Result<&T> {
        let array = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| self.error(format!("missing column '{name}'")))?;
        array
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| self.error(format!("column '{name}' has type {}", array.data_type())))
    }

    fn null_error(&self, name: &str, row: usize) -> AnalizarError {
        self.error(format!("column '{name}' is null in row {row}"))
    }

    fn strings(&self, name: &str) -> Result<Vec<String>> {
        let array = self.column::<StringArray>(name)?;
        array
            .iter()
            .enumerate()
            .map(|(row, v)| v.map(str::to_string).ok_or_else(|| self.null_error(name, row)))
            .collect()
    }

    fn integers(&self, name: &str) -> Result<Vec<i64>> {
        let array = self.column::<Int64Array>(name)?;
        array
            .iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| self.null_error(name, row)))
            .collect()
    }

    fn floats(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.column::<Float64Array>(name)?.iter().collect())
    }

    fn labels(&self, column: ConfigColumn) -> Result<Vec<Label>> {
        if column.is_integer() {
            Ok(self.integers(column.name())?.into_iter().map(Label::Integer).collect())
        } else {
            Ok(self.strings(column.name())?.into_iter().map(Label::Text).collect())
        }
    }

    fn int_lists(&self, name: &str) -> Result<Vec<Vec<i64>>> {
        let array = self.column::<ListArray>(name)?;
        (0..array.len())
            .map(|row| {
                if array.is_null(row) {
                    return Err(self.null_error(name, row));
                }
                let values = array.value(row);
                let values = values
                    .as_any()
                    .downcast_ref::<Int64Array>()
                    .ok_or_else(|| self.error(format!("column '{name}' is not a list of Int64")))?;
                Ok(values.values().to_vec())
            })
            .collect()
    }

    fn float_lists(&self, name: &str) -> Result<Vec<Option<Vec<f64>>>> {
        let array = self.column::<ListArray>(name)?;
        (0..array.len())
            .map(|row| {
                if array.is_null(row) {
                    return Ok(None);
                }
                let values = array.value(row);
                let values = values
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| {
                        self.error(format!("column '{name}' is not a list of Float64"))
                    })?;
                Ok(Some(values.values().to_vec()))
            })
            .collect()
    }

    fn required_float_lists(&self, name: &str) -> Result<Vec<Vec<f64>>> {
        self.float_lists(name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| self.null_error(name, row)))
            .collect()
    }
}

/// Group-key and retained label columns of a summary, row-major.
fn read_label_rows(table: &Table, columns: &[ConfigColumn]) -> Result<Vec<Vec<Label>>> {
    let mut rows = vec![Vec::with_capacity(columns.len()); table.rows()];
    for &column in columns {
        for (row, label) in rows.iter_mut().zip(table.labels(column)?) {
            row.push(label);
        }
    }
    Ok(rows)
}

fn label_columns<R>(
    columns: &[ConfigColumn],
    rows: &[R],
    pick: impl Fn(&R, usize) -> &Label,
) -> Vec<(String, ArrayRef)> {
    columns
        .iter()
        .enumerate()
        .map(|(i, &column)| {
            (column.name().to_string(), labels(column, rows.iter().map(|r| pick(r, i))))
        })
        .collect()
}

// Run tables

/// Persist a run table.
pub fn write_run_table(path: &Path, table: &RunTable) -> Result<()> {
    let runs = table.runs();
    let mut columns: Vec<(String, ArrayRef)> =
        vec![(CONFIG.into(), strings(runs.iter().map(|r| r.config.as_str())))];
    for column in ConfigColumn::ALL {
        let values: Vec<Label> = runs.iter().map(|r| column.value(r)).collect();
        columns.push((column.name().into(), labels(column, values.iter())));
    }
    for step in StepColumn::ALL {
        columns.push((step.name().into(), int_lists(runs.iter().map(|r| step.values(r)))));
    }
    columns.push((
        SeriesColumn::BestObjectiveValue.name().into(),
        float_lists(runs.iter().map(|r| Some(r.best_objective.as_slice()))),
    ));
    columns.push((
        SeriesColumn::MinimumIndividualDistance.name().into(),
        float_lists(runs.iter().map(|r| Some(r.min_individual_distance.as_slice()))),
    ));
    columns.push((
        SeriesColumn::DistanceToOptimum.name().into(),
        float_lists(runs.iter().map(|r| r.distance_to_optimum.as_deref())),
    ));
    columns.push((
        FINAL_DISTANCE.into(),
        Arc::new(Float64Array::from_iter(runs.iter().map(|r| r.final_distance))),
    ));
    columns.push((AOCC.into(), Arc::new(Float64Array::from_iter(runs.iter().map(|r| r.aocc)))));

    write_table(path, columns, HashMap::from([(KIND.to_string(), "runs".to_string())]))
}

/// Reload a run table written by [`write_run_table`].
pub fn read_run_table(path: &Path) -> Result<RunTable> {
    let table = read_table(path)?;
    table.expect_kind("runs")?;

    let config = table.strings(CONFIG)?;
    let dataset = table.strings(ConfigColumn::Dataset.name())?;
    let algorithm = table.strings(ConfigColumn::Algorithm.name())?;
    let run = table.integers(ConfigColumn::Run.name())?;
    let function = table.strings(ConfigColumn::Function.name())?;
    let instance = table.strings(ConfigColumn::Instance.name())?;
    let dimension = table.strings(ConfigColumn::Dimension.name())?;
    let group = table.strings(ConfigColumn::Group.name())?;
    let iterations = table.int_lists(StepColumn::Iterations.name())?;
    let evaluations = table.int_lists(StepColumn::Evaluations.name())?;
    let objective = table.required_float_lists(SeriesColumn::BestObjectiveValue.name())?;
    let diversity = table.required_float_lists(SeriesColumn::MinimumIndividualDistance.name())?;
    let distance = table.float_lists(SeriesColumn::DistanceToOptimum.name())?;
    let final_distance = table.floats(FINAL_DISTANCE)?;
    let aocc = table.floats(AOCC)?;

    let mut runs = Vec::with_capacity(table.rows());
    for i in 0..table.rows() {
        let group = FunctionGroup::from_name(&group[i])
            .ok_or_else(|| table.error(format!("unknown function group '{}'", group[i])))?;
        runs.push(Run {
            config: config[i].clone(),
            dataset: dataset[i].clone(),
            algorithm: algorithm[i].clone(),
            run: run[i],
            function: function[i].clone(),
            instance: instance[i].clone(),
            dimension: dimension[i].clone(),
            group,
            iterations: iterations[i].clone(),
            evaluations: evaluations[i].clone(),
            best_objective: objective[i].clone(),
            min_individual_distance: diversity[i].clone(),
            distance_to_optimum: distance[i].clone(),
            final_distance: final_distance[i],
            aocc: aocc[i],
        });
    }
    Ok(RunTable::new(runs))
}

// Summaries

fn summary_metadata(
    kind: &str,
    group_keys: &[ConfigColumn],
    retained: &[ConfigColumn],
) -> HashMap<String, String> {
    HashMap::from([
        (KIND.to_string(), kind.to_string()),
        (GROUP_KEYS.to_string(), join(group_keys.iter().map(|c| c.name()))),
        (RETAINED.to_string(), join(retained.iter().map(|c| c.name()))),
    ])
}

/// Persist a process summary.
pub fn write_process_summary(path: &Path, summary: &ProcessSummary) -> Result<()> {
    let rows = &summary.rows;
    let mut columns = label_columns(&summary.group_keys, rows, |r, i| &r.key[i]);
    columns.extend(label_columns(&summary.retained, rows, |r, i| &r.retained[i]));
    columns.push((
        summary.step_column.name().into(),
        int_lists(rows.iter().map(|r| r.steps.as_slice())),
    ));
    for (i, column) in summary.value_columns.iter().enumerate() {
        for stat in Stat::ALL {
            columns.push((
                stat.column(column.name()),
                float_lists(rows.iter().map(|r| Some(r.values[i].get(stat)))),
            ));
        }
    }

    let mut metadata = summary_metadata("process", &summary.group_keys, &summary.retained);
    metadata.insert(STEP.into(), summary.step_column.name().into());
    metadata.insert(VALUES.into(), join(summary.value_columns.iter().map(|c| c.name())));
    write_table(path, columns, metadata)
}

/// Reload a process summary written by [`write_process_summary`].
pub fn read_process_summary(path: &Path) -> Result<ProcessSummary> {
    let table = read_table(path)?;
    table.expect_kind("process")?;

    let group_keys: Vec<ConfigColumn> = table.metadata_list(GROUP_KEYS)?;
    let retained: Vec<ConfigColumn> = table.metadata_list(RETAINED)?;
    let step_column: StepColumn = table.metadata(STEP)?.parse()?;
    let value_columns: Vec<SeriesColumn> = table.metadata_list(VALUES)?;

    let keys = read_label_rows(&table, &group_keys)?;
    let kept = read_label_rows(&table, &retained)?;
    let steps = table.int_lists(step_column.name())?;

    let mut values = vec![vec![SeriesStats::default(); value_columns.len()]; table.rows()];
    for (i, column) in value_columns.iter().enumerate() {
        for stat in Stat::ALL {
            let series = table.required_float_lists(&stat.column(column.name()))?;
            for (row, s) in values.iter_mut().zip(series) {
                *row[i].get_mut(stat) = s;
            }
        }
    }

    let rows = keys
        .into_iter()
        .zip(kept)
        .zip(steps)
        .zip(values)
        .map(|(((key, retained), steps), values)| ProcessRow { key, retained, steps, values })
        .collect();
    Ok(ProcessSummary { group_keys, retained, step_column, value_columns, rows })
}

/// Persist a scalar summary.
pub fn write_scalar_summary(path: &Path, summary: &ScalarSummary) -> Result<()> {
    let rows = &summary.rows;
    let mut columns = label_columns(&summary.group_keys, rows, |r, i| &r.key[i]);
    columns.extend(label_columns(&summary.retained, rows, |r, i| &r.retained[i]));
    columns.push((
        last_column(StepColumn::Iterations),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.iterations_last))),
    ));
    columns.push((
        last_column(StepColumn::Evaluations),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.evaluations_last))),
    ));
    for (i, column) in summary.value_columns.iter().enumerate() {
        for stat in Stat::ALL {
            columns.push((
                stat.column(column.name()),
                Arc::new(Float64Array::from_iter_values(
                    rows.iter().map(|r| r.values[i].get(stat)),
                )),
            ));
        }
    }

    let mut metadata = summary_metadata("scalar", &summary.group_keys, &summary.retained);
    metadata.insert(VALUES.into(), join(summary.value_columns.iter().map(|c| c.name())));
    write_table(path, columns, metadata)
}

/// Reload a scalar summary written by [`write_scalar_summary`].
pub fn read_scalar_summary(path: &Path) -> Result<ScalarSummary> {
    let table = read_table(path)?;
    table.expect_kind("scalar")?;

    let group_keys: Vec<ConfigColumn> = table.metadata_list(GROUP_KEYS)?;
    let retained: Vec<ConfigColumn> = table.metadata_list(RETAINED)?;
    let value_columns: Vec<ScalarColumn> = table.metadata_list(VALUES)?;

    let keys = read_label_rows(&table, &group_keys)?;
    let kept = read_label_rows(&table, &retained)?;
    let iterations_last = table.integers(&last_column(StepColumn::Iterations))?;
    let evaluations_last = table.integers(&last_column(StepColumn::Evaluations))?;

    let mut values = vec![vec![ScalarStats::default(); value_columns.len()]; table.rows()];
    for (i, column) in value_columns.iter().enumerate() {
        for stat in Stat::ALL {
            let name = stat.column(column.name());
            for (row, v) in values.iter_mut().zip(table.floats(&name)?) {
                row[i].set(stat, v.unwrap_or(f64::NAN));
            }
        }
    }

    let rows = keys
        .into_iter()
        .zip(kept)
        .zip(iterations_last.into_iter().zip(evaluations_last))
        .zip(values)
        .map(|(((key, retained), (iterations_last, evaluations_last)), values)| ScalarRow {
            key,
            retained,
            iterations_last,
            evaluations_last,
            values,
        })
        .collect();
    Ok(ScalarSummary { group_keys, retained, value_columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::tests::sample_run;
    use crate::summary::{summarise_process, summarise_scalar};

    fn table() -> RunTable {
        let mut a = sample_run("1_PSO_f001_i01_d10");
        a.distance_to_optimum = Some(vec![3.0, 2.0, 1.0]);
        a.final_distance = Some(1.0);
        a.aocc = Some(0.4);
        let b = sample_run("2_PSO_f013_i02_d10");
        RunTable::new(vec![a, b])
    }

    #[test]
    fn test_run_table_survives_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataframes/PSO_d10_full.feather");
        let original = table();
        write_run_table(&path, &original).unwrap();
        assert!(!dir.path().join("dataframes/PSO_d10_full.feather.partial").exists());

        let loaded = read_run_table(&path).unwrap();
        assert_eq!(loaded, original);
        assert!(loaded.runs()[1].distance_to_optimum.is_none());
        assert_eq!(loaded.runs()[1].group, FunctionGroup::Group3);
    }

    #[test]
    fn test_process_summary_survives_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("functions_process_summaries.feather");
        let summary = summarise_process(
            &table(),
            &[ConfigColumn::Function, ConfigColumn::Run],
            &[SeriesColumn::BestObjectiveValue, SeriesColumn::MinimumIndividualDistance],
            StepColumn::Evaluations,
            &[ConfigColumn::Algorithm],
        )
        .unwrap();
        write_process_summary(&path, &summary).unwrap();
        assert_eq!(read_process_summary(&path).unwrap(), summary);
    }

    #[test]
    fn test_scalar_summary_survives_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_summaries.feather");
        let mut runs = table();
        runs.runs_mut()[1].final_distance = Some(2.0);
        runs.runs_mut()[1].aocc = Some(0.1);
        let summary = summarise_scalar(
            &runs,
            &[ConfigColumn::Algorithm],
            &[ScalarColumn::FinalDistance, ScalarColumn::Aocc],
            &[ConfigColumn::Dimension],
        )
        .unwrap();
        write_scalar_summary(&path, &summary).unwrap();

        let loaded = read_scalar_summary(&path).unwrap();
        assert_eq!(loaded.group_keys, summary.group_keys);
        assert_eq!(loaded.retained, summary.retained);
        assert_eq!(loaded.rows[0].key, summary.rows[0].key);
        for stat in Stat::ALL {
            let (a, b) = (loaded.rows[0].values[1].get(stat), summary.rows[0].values[1].get(stat));
            assert!((a - b).abs() < 1e-12, "{stat}: {a} != {b}");
        }
    }

    #[test]
    fn test_kind_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.feather");
        write_run_table(&path, &table()).unwrap();
        assert!(matches!(read_scalar_summary(&path), Err(AnalizarError::Storage { .. })));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_run_table(&dir.path().join("absent.feather")),
            Err(AnalizarError::Io { .. })
        ));
    }
}
