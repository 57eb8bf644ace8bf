//! Reductions shared by the summarisers.

use std::fmt;
use std::str::FromStr;

use analizar_common::{AnalizarError, Result};
use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Summary statistic; persisted as a `_<name>` column suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Mean,
    Std,
    Median,
    Min,
    Max,
}

impl Stat {
    pub const ALL: [Stat; 5] = [Self::Mean, Self::Std, Self::Median, Self::Min, Self::Max];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Std => "std",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Persisted column name, e.g. `FinalDistance_mean`.
    pub fn column(self, value_column: &str) -> String {
        format!("{value_column}_{}", self.name())
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stat {
    type Err = AnalizarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|st| st.name() == s).ok_or_else(|| AnalizarError::ConfigValue {
            field: "stat".into(),
            message: format!("unknown statistic '{s}'"),
            suggestion: "Use mean, std, median, min or max".into(),
        })
    }
}

/// Pointwise reductions of a stack of trajectories.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub median: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl SeriesStats {
    pub fn get(&self, stat: Stat) -> &[f64] {
        match stat {
            Stat::Mean => &self.mean,
            Stat::Std => &self.std,
            Stat::Median => &self.median,
            Stat::Min => &self.min,
            Stat::Max => &self.max,
        }
    }

    pub fn get_mut(&mut self, stat: Stat) -> &mut Vec<f64> {
        match stat {
            Stat::Mean => &mut self.mean,
            Stat::Std => &mut self.std,
            Stat::Median => &mut self.median,
            Stat::Min => &mut self.min,
            Stat::Max => &mut self.max,
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Reductions of one scalar per run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScalarStats {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl ScalarStats {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Mean => self.mean,
            Stat::Std => self.std,
            Stat::Median => self.median,
            Stat::Min => self.min,
            Stat::Max => self.max,
        }
    }

    pub fn set(&mut self, stat: Stat, value: f64) {
        match stat {
            Stat::Mean => self.mean = value,
            Stat::Std => self.std = value,
            Stat::Median => self.median = value,
            Stat::Min => self.min = value,
            Stat::Max => self.max = value,
        }
    }
}

/// Median of a sorted slice; NaN if empty.
fn sorted_median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Reduce a runs × steps stack column by column.
///
/// Std is the population deviation; a NaN anywhere in a column makes every
/// statistic of that column NaN.
pub fn reduce_columns(stack: ArrayView2<'_, f64>) -> SeriesStats {
    if stack.nrows() == 0 {
        let nan = vec![f64::NAN; stack.ncols()];
        return SeriesStats {
            mean: nan.clone(),
            std: nan.clone(),
            median: nan.clone(),
            min: nan.clone(),
            max: nan,
        };
    }

    let mean = stack.mean_axis(Axis(0)).map(|m| m.to_vec()).unwrap_or_default();
    let std = stack.std_axis(Axis(0), 0.0).to_vec();
    let min = stack.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| nan_min(acc, v)).to_vec();
    let max = stack.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| nan_max(acc, v)).to_vec();
    let median = stack
        .axis_iter(Axis(1))
        .map(|column| {
            if column.iter().any(|v| v.is_nan()) {
                return f64::NAN;
            }
            let mut values = column.to_vec();
            values.sort_by(f64::total_cmp);
            sorted_median(&values)
        })
        .collect();

    SeriesStats { mean, std, median, min, max }
}

/// Reduce one scalar per run.
///
/// NaN values are skipped; std is the sample deviation and is NaN for a
/// single observation.
pub fn reduce_scalars(values: &[f64]) -> ScalarStats {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = valid.len();
    if n == 0 {
        return ScalarStats {
            mean: f64::NAN,
            std: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }
    valid.sort_by(f64::total_cmp);

    let mean = valid.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let ss: f64 = valid.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    ScalarStats { mean, std, median: sorted_median(&valid), min: valid[0], max: valid[n - 1] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_reduce_columns() {
        let stack = array![[1.0, 10.0], [2.0, 20.0], [6.0, 30.0]];
        let stats = reduce_columns(stack.view());
        assert_eq!(stats.mean, vec![3.0, 20.0]);
        assert_eq!(stats.median, vec![2.0, 20.0]);
        assert_eq!(stats.min, vec![1.0, 10.0]);
        assert_eq!(stats.max, vec![6.0, 30.0]);
        assert_relative_eq!(stats.std[0], (14.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.std[1], (200.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_reduce_columns_single_run() {
        let stack = array![[4.0, 5.0]];
        let stats = reduce_columns(stack.view());
        assert_eq!(stats.mean, vec![4.0, 5.0]);
        assert_eq!(stats.std, vec![0.0, 0.0]);
        assert_eq!(stats.median, vec![4.0, 5.0]);
    }

    #[test]
    fn test_reduce_columns_propagates_nan() {
        let stack = array![[1.0, f64::NAN], [2.0, 3.0]];
        let stats = reduce_columns(stack.view());
        assert_eq!(stats.min[0], 1.0);
        for stat in Stat::ALL {
            assert!(stats.get(stat)[1].is_nan(), "{stat} should be NaN");
        }
    }

    #[test]
    fn test_reduce_scalars() {
        let stats = reduce_scalars(&[4.0, 1.0, 3.0, 2.0]);
        assert_relative_eq!(stats.mean, 2.5);
        assert_relative_eq!(stats.median, 2.5);
        assert_relative_eq!(stats.std, (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_eq!((stats.min, stats.max), (1.0, 4.0));
    }

    #[test]
    fn test_reduce_scalars_edge_cases() {
        let single = reduce_scalars(&[7.0]);
        assert_eq!(single.mean, 7.0);
        assert!(single.std.is_nan());

        let skipped = reduce_scalars(&[1.0, f64::NAN, 3.0]);
        assert_eq!(skipped.mean, 2.0);

        assert!(reduce_scalars(&[]).mean.is_nan());
    }

    #[test]
    fn test_stat_columns() {
        assert_eq!(Stat::Mean.column("FinalDistance"), "FinalDistance_mean");
        assert_eq!("median".parse::<Stat>().unwrap(), Stat::Median);
        assert!("mode".parse::<Stat>().is_err());
    }
}
