//! Derived metrics: distance to optimum, final distance and AOCC.

mod reference;

pub use reference::OptimaReference;

use analizar_common::{AnalizarError, Result};
use serde::{Deserialize, Serialize};

use crate::runs::{RunTable, ScalarColumn, SeriesColumn};

pub const DEFAULT_AOCC_LOWER: f64 = 1e-8;
pub const DEFAULT_AOCC_UPPER: f64 = 1e8;

/// Clamp interval of the AOCC transform, in distance units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AoccBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for AoccBounds {
    fn default() -> Self {
        Self { lower: DEFAULT_AOCC_LOWER, upper: DEFAULT_AOCC_UPPER }
    }
}

impl AoccBounds {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lower > 0.0 && self.lower.is_finite() && self.upper.is_finite()) {
            return Err(AnalizarError::ConfigValue {
                field: "metrics.aocc".into(),
                message: format!(
                    "bounds must be finite and positive, got [{}, {}]",
                    self.lower, self.upper
                ),
                suggestion: format!(
                    "use lower = {DEFAULT_AOCC_LOWER:e}, upper = {DEFAULT_AOCC_UPPER:e}"
                ),
            });
        }
        if self.lower >= self.upper {
            return Err(AnalizarError::ConfigValue {
                field: "metrics.aocc".into(),
                message: format!(
                    "lower bound {} is not below upper bound {}",
                    self.lower, self.upper
                ),
                suggestion: "swap the bounds".into(),
            });
        }
        Ok(())
    }
}

/// Replace non-positive distances with machine epsilon so they stay
/// representable on a log axis.
pub fn clamp_distance(raw: f64) -> f64 {
    if raw <= 0.0 {
        f64::EPSILON
    } else {
        raw
    }
}

/// Per-step distance of a best-objective trajectory to `optimum`.
pub fn distance_to_optimum(objective: &[f64], optimum: f64) -> Vec<f64> {
    objective.iter().map(|&v| clamp_distance(v - optimum)).collect()
}

/// Attach the distance-to-optimum trajectory to every run.
///
/// `functions` restricts the candidate `function_instance` tokens; by
/// default every token of the reference is tried. A run with no matching
/// optimum fails the whole table, which is left untouched.
pub fn add_distance_to_optimum(
    table: &mut RunTable,
    reference: &OptimaReference,
    functions: Option<&[String]>,
) -> Result<()> {
    let distances = table
        .iter()
        .map(|run| {
            reference
                .resolve(&run.config, functions)
                .map(|optimum| distance_to_optimum(&run.best_objective, optimum))
                .ok_or_else(|| AnalizarError::MissingReference { key: run.config.clone() })
        })
        .collect::<Result<Vec<_>>>()?;

    for (run, distance) in table.runs_mut().iter_mut().zip(distances) {
        run.distance_to_optimum = Some(distance);
    }
    Ok(())
}

fn final_value(series: &[f64], key: &str) -> Result<f64> {
    series.last().copied().ok_or_else(|| AnalizarError::EmptySeries {
        column: SeriesColumn::DistanceToOptimum.name().into(),
        key: key.into(),
    })
}

/// Store the last distance-to-optimum value of every run.
pub fn add_final_distance(table: &mut RunTable) -> Result<()> {
    let finals = table
        .iter()
        .map(|run| {
            let series = SeriesColumn::DistanceToOptimum.values(run).map_err(|_| {
                AnalizarError::MissingDependency {
                    derived: ScalarColumn::FinalDistance.name().into(),
                    dependency: SeriesColumn::DistanceToOptimum.name().into(),
                    key: run.config.clone(),
                }
            })?;
            final_value(series, &run.config)
        })
        .collect::<Result<Vec<_>>>()?;

    for (run, value) in table.runs_mut().iter_mut().zip(finals) {
        run.final_distance = Some(value);
    }
    Ok(())
}

/// Area over the convergence curve of one distance trajectory.
///
/// Each distance is mapped to `(log10 clamp(d) - log10 lb) / (log10 ub - log10 lb)`
/// and the mean of `1 - g` is returned, so the result lies in `[0, 1]`
/// with 1 meaning the lower bound was reached from the first step.
/// An empty trajectory yields NaN.
pub fn aocc(distances: &[f64], bounds: AoccBounds) -> f64 {
    if distances.is_empty() {
        return f64::NAN;
    }
    let low = bounds.lower.log10();
    let span = bounds.upper.log10() - low;
    let total: f64 = distances
        .iter()
        .map(|&d| {
            let g = (d.clamp(bounds.lower, bounds.upper).log10() - low) / span;
            1.0 - g
        })
        .sum();
    total / distances.len() as f64
}

/// Store the AOCC of every run's distance trajectory.
pub fn add_final_aocc(table: &mut RunTable, bounds: AoccBounds) -> Result<()> {
    bounds.validate()?;
    let values = table
        .iter()
        .map(|run| {
            let series = SeriesColumn::DistanceToOptimum.values(run).map_err(|_| {
                AnalizarError::MissingDependency {
                    derived: ScalarColumn::Aocc.name().into(),
                    dependency: SeriesColumn::DistanceToOptimum.name().into(),
                    key: run.config.clone(),
                }
            })?;
            if series.is_empty() {
                return Err(AnalizarError::EmptySeries {
                    column: SeriesColumn::DistanceToOptimum.name().into(),
                    key: run.config.clone(),
                });
            }
            Ok(aocc(series, bounds))
        })
        .collect::<Result<Vec<_>>>()?;

    for (run, value) in table.runs_mut().iter_mut().zip(values) {
        run.aocc = Some(value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::tests::sample_run;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::path::Path;

    fn reference() -> OptimaReference {
        OptimaReference::new(
            vec![("bbob_f001_i01_d10".into(), 1.0), ("bbob_f002_i01_d10".into(), -2.0)],
            Path::new("<memory>"),
        )
        .unwrap()
    }

    #[test]
    fn test_distance_clamps_non_positive() {
        let d = distance_to_optimum(&[5.0, 1.0, 0.5], 1.0);
        assert_eq!(d, vec![4.0, f64::EPSILON, f64::EPSILON]);
    }

    #[test]
    fn test_add_distance_to_optimum() {
        let mut table = RunTable::new(vec![
            sample_run("1_PSO_f001_i01_d10"),
            sample_run("1_PSO_f002_i01_d10"),
        ]);
        add_distance_to_optimum(&mut table, &reference(), None).unwrap();
        assert_eq!(table.runs()[0].distance_to_optimum, Some(vec![4.0, 2.0, f64::EPSILON]));
        assert_eq!(table.runs()[1].distance_to_optimum, Some(vec![7.0, 5.0, 3.0]));
    }

    #[test]
    fn test_missing_reference_leaves_table_untouched() {
        let mut table = RunTable::new(vec![
            sample_run("1_PSO_f001_i01_d10"),
            sample_run("1_PSO_f003_i01_d10"),
        ]);
        let err = add_distance_to_optimum(&mut table, &reference(), None).unwrap_err();
        assert!(matches!(err, AnalizarError::MissingReference { .. }));
        assert!(table.runs()[0].distance_to_optimum.is_none());
    }

    #[test]
    fn test_final_distance_requires_distance() {
        let mut table = RunTable::new(vec![sample_run("1_PSO_f001_i01_d10")]);
        assert!(matches!(
            add_final_distance(&mut table),
            Err(AnalizarError::MissingDependency { .. })
        ));

        add_distance_to_optimum(&mut table, &reference(), None).unwrap();
        add_final_distance(&mut table).unwrap();
        assert_eq!(table.runs()[0].final_distance, Some(f64::EPSILON));
    }

    #[test]
    fn test_final_distance_rejects_empty_series() {
        let mut run = sample_run("1_PSO_f001_i01_d10");
        run.distance_to_optimum = Some(Vec::new());
        let mut table = RunTable::new(vec![run]);
        assert!(matches!(add_final_distance(&mut table), Err(AnalizarError::EmptySeries { .. })));
    }

    #[test]
    fn test_aocc_reference_points() {
        let bounds = AoccBounds::default();
        assert_relative_eq!(aocc(&[1e-8, 1e-8], bounds), 1.0, epsilon = 1e-12);
        assert_relative_eq!(aocc(&[1e8], bounds), 0.0, epsilon = 1e-12);
        assert_relative_eq!(aocc(&[1.0], bounds), 0.5, epsilon = 1e-12);
        assert_relative_eq!(aocc(&[1e-8, 1e8], bounds), 0.5, epsilon = 1e-12);
        // Outside the bounds clamps
        assert_relative_eq!(aocc(&[1e-20, 1e20], bounds), 0.5, epsilon = 1e-12);
        assert!(aocc(&[], bounds).is_nan());
    }

    #[test]
    fn test_add_final_aocc() {
        let mut table = RunTable::new(vec![sample_run("1_PSO_f002_i01_d10")]);
        assert!(add_final_aocc(&mut table, AoccBounds::default()).is_err());

        table.runs_mut()[0].distance_to_optimum = Some(vec![1.0, 1.0]);
        add_final_aocc(&mut table, AoccBounds::default()).unwrap();
        assert_relative_eq!(table.runs()[0].aocc.unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_validation() {
        assert!(AoccBounds::new(1e-8, 1e8).is_ok());
        assert!(AoccBounds::new(0.0, 1.0).is_err());
        assert!(AoccBounds::new(10.0, 1.0).is_err());
        assert!(AoccBounds::new(1.0, f64::INFINITY).is_err());
    }

    proptest! {
        #[test]
        fn prop_distance_is_positive(
            objective in proptest::collection::vec(-1e6f64..1e6, 1..50),
            optimum in -1e6f64..1e6,
        ) {
            prop_assert!(distance_to_optimum(&objective, optimum).iter().all(|&d| d > 0.0));
        }

        #[test]
        fn prop_aocc_in_unit_interval(distances in proptest::collection::vec(0.0f64..1e12, 1..50)) {
            let value = aocc(&distances, AoccBounds::default());
            prop_assert!((0.0..=1.0).contains(&value));
        }

        #[test]
        fn prop_aocc_decreases_with_distance(d in 1e-8f64..1e7, factor in 1.5f64..10.0) {
            let bounds = AoccBounds::default();
            prop_assert!(aocc(&[d * factor], bounds) < aocc(&[d], bounds));
        }
    }
}
