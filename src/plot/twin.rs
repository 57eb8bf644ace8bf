//! Twin-axis comparison plot: population diversity on the left axis,
//! distance to optimum on the right, both log scale.

use std::error::Error;
use std::ops::Range;
use std::path::Path;

use analizar_common::Result;
use plotters::prelude::*;

use super::{axis_range, ensure_parent, plot_error, AxisScale, PlotStyle, Series};

/// Render one diversity and one distance line per algorithm.
///
/// `left` and `right` are matched by position and share the legend entry
/// of the `left` series.
pub fn render_twin(
    path: &Path,
    title: &str,
    left: &[Series],
    right: &[Series],
    style: PlotStyle,
) -> Result<()> {
    let left: Vec<(&str, Vec<(f64, f64)>)> =
        left.iter().map(|s| (s.label.as_str(), s.projected(AxisScale::Log))).collect();
    let right: Vec<Vec<(f64, f64)>> = right.iter().map(|s| s.projected(AxisScale::Log)).collect();

    let xs = left.iter().flat_map(|(_, p)| p).chain(right.iter().flatten()).map(|p| p.0);
    let (Some(x_range), Some(left_range), Some(right_range)) = (
        axis_range(xs),
        axis_range(left.iter().flat_map(|(_, p)| p).map(|p| p.1)),
        axis_range(right.iter().flatten().map(|p| p.1)),
    ) else {
        return Ok(());
    };
    ensure_parent(path)?;
    draw_twin(path, title, &left, &right, [x_range, left_range, right_range], style)
        .map_err(plot_error)
}

fn draw_twin(
    path: &Path,
    title: &str,
    left: &[(&str, Vec<(f64, f64)>)],
    right: &[Vec<(f64, f64)>],
    [x_range, left_range, right_range]: [Range<f64>; 3],
    style: PlotStyle,
) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, style.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let baseline = left_range.start;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .right_y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), left_range)?
        .set_secondary_coord(x_range, right_range);

    let ticks = |v: &f64| AxisScale::Log.tick(*v);
    chart
        .configure_mesh()
        .x_desc("Function Evaluations")
        .y_desc("Mean Minimum Individual Distance")
        .y_label_formatter(&ticks)
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("Mean Distance to Optimum")
        .y_label_formatter(&ticks)
        .draw()?;

    for (i, (label, points)) in left.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let fill = color.mix(0.2).filled();
        chart.draw_series(AreaSeries::new(points.iter().copied(), baseline, fill))?;
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.mix(0.7).stroke_width(1)))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    for (i, points) in right.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart.draw_secondary_series(LineSeries::new(
            points.iter().copied(),
            color.mix(0.9).stroke_width(2),
        ))?;
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
