//! Line plots of summaries and individual runs.

use std::error::Error;
use std::path::Path;

use analizar_common::Result;
use plotters::prelude::*;

use super::{axis_range, ensure_parent, plot_error, AxisScale, PlotStyle, Series};
use crate::runs::{ConfigColumn, RunTable, SeriesColumn};
use crate::summary::{ProcessRow, ProcessSummary, Stat};

/// Mean trajectory with its ± std envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub mean: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
    pub upper: Vec<(f64, f64)>,
}

/// One line per summary row, labelled by its `hue` column.
pub fn lines_from_process(
    summary: &ProcessSummary,
    column: SeriesColumn,
    stat: Stat,
    hue: ConfigColumn,
) -> Vec<Series> {
    summary
        .rows
        .iter()
        .filter_map(|row| {
            let values = summary.series(row, column, stat)?;
            let label = summary.label(row, hue).map(ToString::to_string).unwrap_or_default();
            let points = row.steps.iter().zip(values).map(|(&x, &y)| (x as f64, y)).collect();
            Some(Series { label, points })
        })
        .collect()
}

/// Mean ± std of `column` in one summary row.
pub fn band_from_process(
    summary: &ProcessSummary,
    row: &ProcessRow,
    column: SeriesColumn,
) -> Option<Band> {
    let mean = summary.series(row, column, Stat::Mean)?;
    let std = summary.series(row, column, Stat::Std)?;
    let at = |offset: f64| -> Vec<(f64, f64)> {
        row.steps
            .iter()
            .zip(mean.iter().zip(std))
            .map(|(&x, (&m, &s))| (x as f64, m + offset * s))
            .collect()
    };
    Some(Band { mean: at(0.0), lower: at(-1.0), upper: at(1.0) })
}

/// One line per run over its evaluation axis, labelled by `hue`.
pub fn lines_from_runs(
    table: &RunTable,
    column: SeriesColumn,
    hue: ConfigColumn,
) -> Result<Vec<Series>> {
    table
        .iter()
        .map(|run| {
            let values = column.values(run)?;
            let points =
                run.evaluations.iter().zip(values).map(|(&x, &y)| (x as f64, y)).collect();
            Ok(Series { label: hue.value(run).to_string(), points })
        })
        .collect()
}

/// Render `series` into `path`; nothing is written when no point is drawable.
pub fn render_lines(
    path: &Path,
    title: &str,
    y_desc: &str,
    series: &[Series],
    scale: AxisScale,
    style: PlotStyle,
) -> Result<()> {
    let projected: Vec<(&str, Vec<(f64, f64)>)> =
        series.iter().map(|s| (s.label.as_str(), s.projected(scale))).collect();
    let points = || projected.iter().flat_map(|(_, p)| p.iter());
    let (Some(x_range), Some(y_range)) =
        (axis_range(points().map(|p| p.0)), axis_range(points().map(|p| p.1)))
    else {
        return Ok(());
    };
    ensure_parent(path)?;
    draw_lines(path, title, y_desc, &projected, (x_range, y_range), scale, style)
        .map_err(plot_error)
}

fn draw_lines(
    path: &Path,
    title: &str,
    y_desc: &str,
    series: &[(&str, Vec<(f64, f64)>)],
    ranges: (std::ops::Range<f64>, std::ops::Range<f64>),
    scale: AxisScale,
    style: PlotStyle,
) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, style.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(ranges.0, ranges.1)?;

    let ticks = move |v: &f64| scale.tick(*v);
    chart
        .configure_mesh()
        .x_desc("Evaluations")
        .y_desc(y_desc)
        .y_label_formatter(&ticks)
        .draw()?;

    for (i, (label, points)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Render a mean line with a shaded ± std envelope.
pub fn render_band(
    path: &Path,
    title: &str,
    y_desc: &str,
    band: &Band,
    style: PlotStyle,
) -> Result<()> {
    let finite = |points: &Vec<(f64, f64)>| -> Vec<(f64, f64)> {
        points.iter().copied().filter(|(_, y)| y.is_finite()).collect()
    };
    let band = Band {
        mean: finite(&band.mean),
        lower: finite(&band.lower),
        upper: finite(&band.upper),
    };
    let all = || band.mean.iter().chain(&band.lower).chain(&band.upper);
    let (Some(x_range), Some(y_range)) =
        (axis_range(all().map(|p| p.0)), axis_range(all().map(|p| p.1)))
    else {
        return Ok(());
    };
    ensure_parent(path)?;
    draw_band(path, title, y_desc, &band, (x_range, y_range), style).map_err(plot_error)
}

fn draw_band(
    path: &Path,
    title: &str,
    y_desc: &str,
    band: &Band,
    ranges: (std::ops::Range<f64>, std::ops::Range<f64>),
    style: PlotStyle,
) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, style.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(ranges.0, ranges.1)?;

    chart.configure_mesh().x_desc("Evaluations").y_desc(y_desc).draw()?;

    let envelope: Vec<(f64, f64)> =
        band.upper.iter().copied().chain(band.lower.iter().rev().copied()).collect();
    chart.draw_series(std::iter::once(Polygon::new(envelope, BLUE.mix(0.3).filled())))?;
    chart.draw_series(LineSeries::new(band.upper.iter().copied(), &BLUE))?;
    chart.draw_series(LineSeries::new(band.lower.iter().copied(), &BLUE))?;
    chart.draw_series(LineSeries::new(band.mean.iter().copied(), BLACK.stroke_width(2)))?;

    root.present()?;
    Ok(())
}
