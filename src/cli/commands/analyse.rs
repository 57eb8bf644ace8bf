//! Analyse command: summaries, CSV exports and plots of one batch.

use std::path::Path;

use analizar_common::Result;

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{AnalyseArgs, AnalysisConfig};
use crate::io::{read_run_table, write_process_summary, write_scalar_csv, write_scalar_summary};
use crate::layout::{png, Layout};
use crate::plot::{
    band_from_process, lines_from_process, lines_from_runs, render_band, render_lines, AxisScale,
    PlotStyle, Series,
};
use crate::runs::{ConfigColumn, RunTable, ScalarColumn, SeriesColumn, StepColumn};
use crate::summary::{summarise_process, summarise_scalar, ProcessSummary, ScalarSummary, Stat};

const PROCESS_COLUMNS: [SeriesColumn; 2] =
    [SeriesColumn::DistanceToOptimum, SeriesColumn::MinimumIndividualDistance];
const SCALAR_COLUMNS: [ScalarColumn; 2] = [ScalarColumn::FinalDistance, ScalarColumn::Aocc];
const STEP: StepColumn = StepColumn::Evaluations;

pub fn run_analyse(args: AnalyseArgs, config: &AnalysisConfig, level: LogLevel) -> Result<()> {
    let plots = config.plots.enabled && !args.no_plots;
    analyse_batch(config, &args.algorithm, &args.dimension, plots, level)
}

struct Batch<'a> {
    layout: Layout,
    dataset: String,
    algorithm: &'a str,
    style: Option<PlotStyle>,
    level: LogLevel,
}

impl Batch<'_> {
    fn process(
        &self,
        table: &RunTable,
        name: &str,
        group_keys: &[ConfigColumn],
        retained: &[ConfigColumn],
    ) -> Result<ProcessSummary> {
        let summary = summarise_process(table, group_keys, &PROCESS_COLUMNS, STEP, retained)?;
        let path = self.layout.process_summary(&self.dataset, name);
        write_process_summary(&path, &summary)?;
        log(
            self.level,
            LogLevel::Verbose,
            &format!("  {name}: {} process rows -> {}", summary.len(), path.display()),
        );
        Ok(summary)
    }

    fn scalar(
        &self,
        table: &RunTable,
        name: &str,
        group_keys: &[ConfigColumn],
        retained: &[ConfigColumn],
    ) -> Result<ScalarSummary> {
        let summary = summarise_scalar(table, group_keys, &SCALAR_COLUMNS, retained)?;
        write_scalar_summary(&self.layout.scalar_summary(&self.dataset, name), &summary)?;
        let csv = self.layout.summary_csv(&self.dataset, name);
        write_scalar_csv(&csv, &summary)?;
        log(
            self.level,
            LogLevel::Verbose,
            &format!("  {name}: {} scalar rows -> {}", summary.len(), csv.display()),
        );
        Ok(summary)
    }

    /// Mean trajectories of every row, one image per column.
    fn summary_lines(&self, summary: &ProcessSummary, hue: ConfigColumn, name: &str) -> Result<()> {
        let Some(style) = self.style else {
            return Ok(());
        };
        let dir = self.layout.plot_dir(&self.dataset).join("summary_lineplots");
        for column in PROCESS_COLUMNS {
            let series = lines_from_process(summary, column, Stat::Mean, hue);
            let y = Stat::Mean.column(column.name());
            draw_lines(&dir, &format!("{name}_{STEP}_{y}"), &y, &series, column, style)?;
        }
        Ok(())
    }

    /// Mean ± std envelopes of every row.
    fn diversity(&self, summary: &ProcessSummary, name: &str) -> Result<()> {
        let Some(style) = self.style else {
            return Ok(());
        };
        let dir = self.layout.plot_dir(&self.dataset).join("diversity").join("summary");
        for row in &summary.rows {
            for column in PROCESS_COLUMNS {
                if let Some(band) = band_from_process(summary, row, column) {
                    let y = Stat::Mean.column(column.name());
                    render_band(&png(&dir, &format!("{name}_{STEP}_{y}")), name, &y, &band, style)?;
                }
            }
        }
        Ok(())
    }

    /// Every run of one (function, instance) pair, coloured by run number.
    fn individual_runs(&self, runs: &RunTable, name: &str) -> Result<()> {
        let Some(style) = self.style else {
            return Ok(());
        };
        let dir = self.layout.plot_dir(&self.dataset).join("individual_lineplots");
        for column in PROCESS_COLUMNS {
            let series = lines_from_runs(runs, column, ConfigColumn::Run)?;
            let file = format!("{}_{name}_{STEP}_{column}", self.algorithm);
            draw_lines(&dir, &file, column.name(), &series, column, style)?;
        }
        Ok(())
    }
}

fn draw_lines(
    dir: &Path,
    file: &str,
    y_desc: &str,
    series: &[Series],
    column: SeriesColumn,
    style: PlotStyle,
) -> Result<()> {
    render_lines(&png(dir, file), file, y_desc, series, AxisScale::Linear, style)?;
    if AxisScale::has_log_variant(column) {
        let file = format!("{file}_logscale");
        render_lines(&png(dir, &file), &file, y_desc, series, AxisScale::Log, style)?;
    }
    Ok(())
}

/// Summarise one converted batch overall, per function group, per function
/// and per instance, and optionally plot the results.
pub fn analyse_batch(
    config: &AnalysisConfig,
    algorithm: &str,
    dimension: &str,
    plots: bool,
    level: LogLevel,
) -> Result<()> {
    let layout = Layout::new(&config.paths);
    let dataset = Layout::dataset(algorithm, dimension);
    let table = read_run_table(&layout.full_table(&dataset))?;
    log(level, LogLevel::Normal, &format!("Analysing {} runs of {dataset}", table.len()));

    let batch = Batch {
        layout,
        dataset: dataset.clone(),
        algorithm,
        style: plots.then(|| PlotStyle::from(&config.plots)),
        level,
    };

    let algorithm_key = [ConfigColumn::Algorithm];

    // Algorithm-level behaviour
    let all = batch.process(&table, "all", &algorithm_key, &[])?;
    batch.scalar(&table, "all", &algorithm_key, &[])?;
    batch.summary_lines(&all, ConfigColumn::Algorithm, "all_process")?;
    batch.diversity(&all, &format!("{dataset}_all_diversity"))?;

    // Problem-dependent behaviour
    let functions = batch.process(&table, "functions", &[ConfigColumn::Function], &algorithm_key)?;
    batch.scalar(&table, "functions", &[ConfigColumn::Function], &algorithm_key)?;
    batch.summary_lines(&functions, ConfigColumn::Function, "function_process")?;
    for row in &functions.rows {
        let single = ProcessSummary { rows: vec![row.clone()], ..functions.clone() };
        let function = row.key.first().map(ToString::to_string).unwrap_or_default();
        batch.diversity(&single, &format!("{dataset}_{function}"))?;
    }

    let groups = batch.process(&table, "groups", &[ConfigColumn::Group], &algorithm_key)?;
    batch.scalar(&table, "groups", &[ConfigColumn::Group], &algorithm_key)?;
    batch.summary_lines(&groups, ConfigColumn::Group, "group_process")?;

    let by_instance = [ConfigColumn::Function, ConfigColumn::Instance];
    batch.scalar(&table, "instances", &by_instance, &algorithm_key)?;

    for (function, runs) in table.partition(ConfigColumn::Function) {
        let name = format!("{function}_instances");
        let instances = batch.process(&runs, &name, &[ConfigColumn::Instance], &algorithm_key)?;
        let lines_name = format!("{function}_instance_process");
        batch.summary_lines(&instances, ConfigColumn::Instance, &lines_name)?;
        for (instance, instance_runs) in runs.partition(ConfigColumn::Instance) {
            batch.individual_runs(&instance_runs, &format!("{dataset}_{function}_{instance}"))?;
        }
    }

    log(
        level,
        LogLevel::Normal,
        &format!("Wrote summaries to {}", batch.layout.analysis_dir(&dataset).display()),
    );
    Ok(())
}
