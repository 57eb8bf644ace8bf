//! Compare command: cross-algorithm plots and Friedman/Nemenyi rankings.

use std::collections::BTreeMap;

use analizar_common::{AnalizarError, Result};

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::compare::{compare, write_json, ComparisonMatrix, ComparisonReport, ComparisonScope};
use crate::config::{AnalysisConfig, CompareArgs};
use crate::io::{read_process_summary, read_scalar_summary};
use crate::layout::{png, Layout};
use crate::plot::{lines_from_process, render_critical_difference, render_twin, PlotStyle, Series};
use crate::runs::{ConfigColumn, Label, ScalarColumn, SeriesColumn};
use crate::summary::{ProcessSummary, ScalarSummary, Stat};

const COMPARED: (ScalarColumn, Stat) = (ScalarColumn::FinalDistance, Stat::Mean);

pub fn run_compare(args: CompareArgs, config: &AnalysisConfig, level: LogLevel) -> Result<()> {
    let plots = config.plots.enabled && !args.no_plots;
    compare_dimension(config, &args.dimension, plots, level).map(|_| ())
}

/// Scalar summaries of every configured algorithm, tagged with their dataset.
fn combined_scalars(
    config: &AnalysisConfig,
    layout: &Layout,
    dimension: &str,
    name: &str,
) -> Result<ScalarSummary> {
    let parts = config
        .comparison
        .algorithms
        .iter()
        .map(|algorithm| {
            let dataset = Layout::dataset(algorithm, dimension);
            read_scalar_summary(&layout.scalar_summary(&dataset, name))
                .map(|s| s.with_label(ConfigColumn::Dataset, Label::from(dataset)))
        })
        .collect::<Result<Vec<_>>>()?;
    ScalarSummary::concat(parts)
}

fn series_of(
    processes: &BTreeMap<String, ProcessSummary>,
    algorithms: &[String],
    function: &Label,
    column: SeriesColumn,
) -> Vec<Series> {
    algorithms
        .iter()
        .filter_map(|algorithm| {
            let summary = processes.get(algorithm)?;
            let mut lines = lines_from_process(summary, column, Stat::Mean, ConfigColumn::Function);
            let line = lines.iter().position(|s| s.label == function.to_string())?;
            let mut line = lines.swap_remove(line);
            line.label = algorithm.clone();
            Some(line)
        })
        .collect()
}

fn twin_plots(
    config: &AnalysisConfig,
    layout: &Layout,
    dimension: &str,
    style: PlotStyle,
) -> Result<()> {
    let processes = config
        .comparison
        .algorithms
        .iter()
        .map(|algorithm| {
            let dataset = Layout::dataset(algorithm, dimension);
            read_process_summary(&layout.process_summary(&dataset, "functions"))
                .map(|summary| (algorithm.clone(), summary))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    let dir = layout.comparison_dir(dimension);
    for function in &config.comparison.functions {
        let label = Label::from(function.as_str());
        for set in &config.comparison.plot_sets {
            let algorithms = &set.algorithms;
            let left =
                series_of(&processes, algorithms, &label, SeriesColumn::MinimumIndividualDistance);
            let right = series_of(&processes, algorithms, &label, SeriesColumn::DistanceToOptimum);
            let name = format!("{function}_comparison_{}", set.name);
            render_twin(&png(&dir, &name), &name, &left, &right, style)?;
        }
    }
    Ok(())
}

fn finish(
    report: &ComparisonReport,
    layout: &Layout,
    dimension: &str,
    function: Option<&str>,
    alpha: f64,
    style: Option<PlotStyle>,
    level: LogLevel,
) -> Result<()> {
    let path = layout.comparison_report(dimension, function);
    write_json(report, &path)?;
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  {}: chi2 = {:.4}, p = {:.4e}{} -> {}",
            report.scope,
            report.statistic,
            report.p_value,
            if report.significant { " (significant)" } else { "" },
            path.display()
        ),
    );
    if let Some(ranking) = report.ranking() {
        for (name, rank) in ranking {
            log(level, LogLevel::Verbose, &format!("    {name}: {rank:.4}"));
        }
    }
    if let Some(style) = style {
        let path = layout.critical_difference(dimension, function);
        render_critical_difference(&path, report, alpha, style)?;
    }
    Ok(())
}

/// Reports of one dimension: the global ranking over functions first,
/// then one ranking over instances per function.
pub fn compare_dimension(
    config: &AnalysisConfig,
    dimension: &str,
    plots: bool,
    level: LogLevel,
) -> Result<Vec<ComparisonReport>> {
    let layout = Layout::new(&config.paths);
    let settings = &config.comparison;
    let style = plots.then(|| PlotStyle::from(&config.plots));
    log(
        level,
        LogLevel::Normal,
        &format!("Comparing {} algorithms on {dimension}", settings.algorithms.len()),
    );

    if let Some(style) = style {
        twin_plots(config, &layout, dimension, style)?;
    }

    let treatments: Vec<Label> =
        settings.algorithms.iter().map(|a| Label::from(a.as_str())).collect();
    let mut reports = Vec::with_capacity(settings.functions.len() + 1);

    let functions = combined_scalars(config, &layout, dimension, "functions")?;
    let blocks: Vec<Label> = settings.functions.iter().map(|f| Label::from(f.as_str())).collect();
    let matrix = ComparisonMatrix::build(
        &functions,
        ConfigColumn::Function,
        ConfigColumn::Algorithm,
        &blocks,
        &treatments,
        COMPARED,
    )?;
    let global = ComparisonScope::Global;
    let report = compare(&matrix, &global, settings.global_post_hoc, settings.alpha)?;
    finish(&report, &layout, dimension, None, settings.alpha, style, level)?;
    reports.push(report);

    let instances = combined_scalars(config, &layout, dimension, "instances")?;
    for function in &settings.functions {
        let rows = instances.filter(ConfigColumn::Function, &Label::from(function.as_str()));
        let mut blocks: Vec<Label> = rows
            .rows
            .iter()
            .filter_map(|row| rows.label(row, ConfigColumn::Instance))
            .cloned()
            .collect();
        blocks.sort();
        blocks.dedup();
        if blocks.is_empty() {
            return Err(AnalizarError::InsufficientData {
                test: "Friedman".into(),
                message: format!("no instances of {function} in the instance summaries"),
            });
        }
        let matrix = ComparisonMatrix::build(
            &rows,
            ConfigColumn::Instance,
            ConfigColumn::Algorithm,
            &blocks,
            &treatments,
            COMPARED,
        )?;
        let scope = ComparisonScope::Function(function.clone());
        let report = compare(&matrix, &scope, settings.per_function_post_hoc, settings.alpha)?;
        finish(&report, &layout, dimension, Some(function.as_str()), settings.alpha, style, level)?;
        reports.push(report);
    }

    Ok(reports)
}
