//! Configuration: YAML pipeline settings and command-line arguments.

mod analysis;
mod args;

pub use analysis::{
    AnalysisConfig, ComparisonConfig, IngestConfig, MetricsConfig, PathsConfig, PlotConfig,
    PlotSet,
};
pub use args::{parse_args, AnalyseArgs, Cli, Command, CompareArgs, ConvertArgs};
