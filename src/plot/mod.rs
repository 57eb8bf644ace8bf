//! PNG rendering of summaries, individual runs and rankings.
//!
//! Plot data is assembled by pure functions (`lines_from_*`, `band_from_process`,
//! `cliques`, `axis_range`) and handed to the `render_*` functions, which
//! only draw. Log-scale axes are drawn on log10-projected values with
//! exponent tick labels.

mod critical_difference;
mod lines;
mod twin;

pub use critical_difference::{cliques, render_critical_difference};
pub use lines::{
    band_from_process, lines_from_process, lines_from_runs, render_band, render_lines, Band,
};
pub use twin::render_twin;

use std::fs;
use std::ops::Range;
use std::path::Path;

use analizar_common::{AnalizarError, Result};

use crate::config::PlotConfig;
use crate::runs::SeriesColumn;

/// Image size of every rendered plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
}

impl From<&PlotConfig> for PlotStyle {
    fn from(config: &PlotConfig) -> Self {
        Self { width: config.width, height: config.height }
    }
}

impl PlotStyle {
    fn size(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Value axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    Log,
}

impl AxisScale {
    /// Whether `column` gets an extra log-scale rendering.
    pub fn has_log_variant(column: SeriesColumn) -> bool {
        column == SeriesColumn::DistanceToOptimum
    }

    /// Position of `value` on this axis, `None` for values it cannot show.
    pub fn project(self, value: f64) -> Option<f64> {
        match self {
            _ if !value.is_finite() => None,
            Self::Linear => Some(value),
            Self::Log if value > 0.0 => Some(value.log10()),
            Self::Log => None,
        }
    }

    /// Tick label of an axis position.
    pub fn tick(self, position: f64) -> String {
        match self {
            Self::Linear => format!("{position:.3}"),
            Self::Log => format!("{:.0e}", 10f64.powf(position)),
        }
    }
}

/// One labelled polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    /// Points projected onto `scale`, dropping those it cannot show.
    pub fn projected(&self, scale: AxisScale) -> Vec<(f64, f64)> {
        self.points.iter().filter_map(|&(x, y)| scale.project(y).map(|y| (x, y))).collect()
    }
}

/// Padded range covering every finite value, `None` when there is none.
pub fn axis_range(values: impl IntoIterator<Item = f64>) -> Option<Range<f64>> {
    let (low, high) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let span = high - low;
    let pad = if span > 0.0 { span * 0.05 } else { 0.5 };
    Some((low - pad)..(high + pad))
}

fn plot_error(error: impl std::fmt::Display) -> AnalizarError {
    AnalizarError::Plot { message: error.to_string() }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|e| AnalizarError::io(format!("creating {}", parent.display()), e)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_range_pads_span() {
        let range = axis_range([1.0, 3.0, f64::NAN, 2.0]).unwrap();
        assert_relative_eq!(range.start, 0.9);
        assert_relative_eq!(range.end, 3.1);
    }

    #[test]
    fn test_axis_range_degenerate() {
        assert_eq!(axis_range([2.0, 2.0]), Some(1.5..2.5));
        assert_eq!(axis_range([f64::NAN, f64::INFINITY]), None);
        assert_eq!(axis_range(std::iter::empty()), None);
    }

    #[test]
    fn test_log_projection_drops_non_positive() {
        let series = Series {
            label: "PSO".into(),
            points: vec![(0.0, 100.0), (1.0, 0.0), (2.0, 0.01)],
        };
        let projected = series.projected(AxisScale::Log);
        assert_eq!(projected.len(), 2);
        assert_relative_eq!(projected[0].1, 2.0);
        assert_relative_eq!(projected[1].1, -2.0);
        assert_eq!(series.projected(AxisScale::Linear).len(), 3);
    }

    #[test]
    fn test_log_ticks() {
        assert_eq!(AxisScale::Log.tick(3.0), "1e3");
        assert_eq!(AxisScale::Log.tick(-2.0), "1e-2");
    }

    #[test]
    fn test_log_variant_columns() {
        assert!(AxisScale::has_log_variant(SeriesColumn::DistanceToOptimum));
        assert!(!AxisScale::has_log_variant(SeriesColumn::MinimumIndividualDistance));
    }
}
