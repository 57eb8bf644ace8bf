//! Typed column identifiers for the run table and its summaries.
//!
//! Columns are addressed by enum rather than by string so grouping keys,
//! retained columns and reduced values are checked at compile time; the
//! persisted column names are produced by `name()` and parsed back by
//! `FromStr`.

use std::fmt;
use std::str::FromStr;

use analizar_common::{AnalizarError, Result};
use serde::{Deserialize, Serialize};

use super::Run;

/// Value of a categorical column.
///
/// `Integer` sorts before `Text`, and integers sort numerically, so run
/// indices order as 1, 2, 10 rather than 1, 10, 2.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

/// Categorical columns usable as grouping keys or retained columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigColumn {
    /// `{algorithm}_{dimension}` discriminator of one experiment batch.
    Dataset,
    Algorithm,
    Function,
    Instance,
    Dimension,
    Group,
    Run,
}

impl ConfigColumn {
    pub const ALL: [ConfigColumn; 7] = [
        Self::Dataset,
        Self::Algorithm,
        Self::Run,
        Self::Function,
        Self::Instance,
        Self::Dimension,
        Self::Group,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Dataset => "Dataset",
            Self::Algorithm => "Algorithm",
            Self::Function => "Function",
            Self::Instance => "Instance",
            Self::Dimension => "Dimension",
            Self::Group => "Group",
            Self::Run => "Run",
        }
    }

    /// Whether the column holds integers rather than text.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Run)
    }

    /// Value of this column for one run.
    pub fn value(self, run: &Run) -> Label {
        match self {
            Self::Dataset => Label::from(run.dataset.as_str()),
            Self::Algorithm => Label::from(run.algorithm.as_str()),
            Self::Function => Label::from(run.function.as_str()),
            Self::Instance => Label::from(run.instance.as_str()),
            Self::Dimension => Label::from(run.dimension.as_str()),
            Self::Group => Label::from(run.group.name()),
            Self::Run => Label::Integer(run.run),
        }
    }
}

impl fmt::Display for ConfigColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigColumn {
    type Err = AnalizarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AnalizarError::ConfigValue {
                field: "column".into(),
                message: format!("unknown configuration column '{s}'"),
                suggestion: "Use one of Dataset, Algorithm, Run, Function, Instance, Dimension, \
                             Group"
                    .into(),
            })
    }
}

/// Step axis columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepColumn {
    Iterations,
    Evaluations,
}

impl StepColumn {
    pub const ALL: [StepColumn; 2] = [Self::Iterations, Self::Evaluations];

    pub fn name(self) -> &'static str {
        match self {
            Self::Iterations => "Iterations",
            Self::Evaluations => "Evaluations",
        }
    }

    pub fn values(self, run: &Run) -> &[i64] {
        match self {
            Self::Iterations => &run.iterations,
            Self::Evaluations => &run.evaluations,
        }
    }
}

impl fmt::Display for StepColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StepColumn {
    type Err = AnalizarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|c| c.name() == s).ok_or_else(|| AnalizarError::ConfigValue {
            field: "step_column".into(),
            message: format!("unknown step column '{s}'"),
            suggestion: "Use Iterations or Evaluations".into(),
        })
    }
}

/// Per-step value trajectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesColumn {
    BestObjectiveValue,
    MinimumIndividualDistance,
    DistanceToOptimum,
}

impl SeriesColumn {
    pub const ALL: [SeriesColumn; 3] =
        [Self::BestObjectiveValue, Self::MinimumIndividualDistance, Self::DistanceToOptimum];

    pub fn name(self) -> &'static str {
        match self {
            Self::BestObjectiveValue => "BestObjectiveValue",
            Self::MinimumIndividualDistance => "MinimumIndividualDistance",
            Self::DistanceToOptimum => "DistanceToOptimum",
        }
    }

    /// Trajectory of one run; derived trajectories must already be computed.
    pub fn values(self, run: &Run) -> Result<&[f64]> {
        match self {
            Self::BestObjectiveValue => Ok(&run.best_objective),
            Self::MinimumIndividualDistance => Ok(&run.min_individual_distance),
            Self::DistanceToOptimum => run.distance_to_optimum.as_deref().ok_or_else(|| {
                AnalizarError::MissingDependency {
                    derived: "summary".into(),
                    dependency: self.name().into(),
                    key: run.config.clone(),
                }
            }),
        }
    }
}

impl fmt::Display for SeriesColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SeriesColumn {
    type Err = AnalizarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|c| c.name() == s).ok_or_else(|| AnalizarError::ConfigValue {
            field: "value_column".into(),
            message: format!("unknown trajectory column '{s}'"),
            suggestion: "Use BestObjectiveValue, MinimumIndividualDistance or DistanceToOptimum"
                .into(),
        })
    }
}

/// One scalar per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarColumn {
    FinalDistance,
    Aocc,
}

impl ScalarColumn {
    pub const ALL: [ScalarColumn; 2] = [Self::FinalDistance, Self::Aocc];

    pub fn name(self) -> &'static str {
        match self {
            Self::FinalDistance => "FinalDistance",
            Self::Aocc => "AOCC",
        }
    }

    /// Scalar of one run; it must already be computed.
    pub fn value(self, run: &Run) -> Result<f64> {
        let value = match self {
            Self::FinalDistance => run.final_distance,
            Self::Aocc => run.aocc,
        };
        value.ok_or_else(|| AnalizarError::MissingDependency {
            derived: "summary".into(),
            dependency: self.name().into(),
            key: run.config.clone(),
        })
    }
}

impl fmt::Display for ScalarColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarColumn {
    type Err = AnalizarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|c| c.name() == s).ok_or_else(|| AnalizarError::ConfigValue {
            field: "value_column".into(),
            message: format!("unknown scalar column '{s}'"),
            suggestion: "Use FinalDistance or AOCC".into(),
        })
    }
}
