//! Analysis configuration parsing.
//!
//! Every section is optional in the YAML file; the defaults reproduce the
//! BBOB experiment the pipeline was built for.

use std::path::{Path, PathBuf};

use analizar_common::{AnalizarError, Result};
use serde::{Deserialize, Serialize};

use crate::compare::PostHocPolicy;
use crate::metrics::AoccBounds;
use crate::runs::LogColumns;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub plots: PlotConfig,
}

impl AnalysisConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalizarError::ConfigNotFound { path: path.to_path_buf() });
        }
        let content = std::fs::read_to_string(path).map_err(|e| AnalizarError::Io {
            context: format!("reading config file: {}", path.display()),
            source: e,
        })?;
        Self::from_yaml(&content, path)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| {
            AnalizarError::ConfigParsing { path: path.to_path_buf(), message: e.to_string() }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The file at `path` if given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.metrics.aocc.validate()?;

        let comparison = &self.comparison;
        if !(comparison.alpha > 0.0 && comparison.alpha < 1.0) {
            return Err(AnalizarError::ConfigValue {
                field: "comparison.alpha".into(),
                message: format!("significance level {} is outside (0, 1)", comparison.alpha),
                suggestion: "Use 0.05".into(),
            });
        }
        if comparison.algorithms.len() < 3 {
            return Err(AnalizarError::ConfigValue {
                field: "comparison.algorithms".into(),
                message: format!("{} algorithms listed", comparison.algorithms.len()),
                suggestion: "The Friedman test needs at least 3 algorithms".into(),
            });
        }
        if comparison.functions.is_empty() {
            return Err(AnalizarError::ConfigValue {
                field: "comparison.functions".into(),
                message: "no functions listed".into(),
                suggestion: "List the function ids to block on, e.g. [f001, f002]".into(),
            });
        }
        for set in &comparison.plot_sets {
            let unknown = set.algorithms.iter().find(|a| !comparison.algorithms.contains(a));
            if let Some(missing) = unknown {
                return Err(AnalizarError::ConfigValue {
                    field: format!("comparison.plot_sets.{}", set.name),
                    message: format!("algorithm '{missing}' is not compared"),
                    suggestion: "Add it to comparison.algorithms or drop it from the plot set"
                        .into(),
                });
            }
        }

        if self.plots.width == 0 || self.plots.height == 0 {
            return Err(AnalizarError::ConfigValue {
                field: "plots".into(),
                message: format!("image size {}x{}", self.plots.width, self.plots.height),
                suggestion: "Use a positive width and height".into(),
            });
        }
        Ok(())
    }
}

/// Input and output roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of `<algorithm>/<dimension>/*.cbor` logs
    #[serde(default = "default_log_root")]
    pub log_root: PathBuf,
    /// Root of derived tables, reports and plots
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_datasets_dir")]
    pub datasets_dir: PathBuf,
    /// Optimum reference CSV inside `datasets_dir`
    #[serde(default = "default_optima_file")]
    pub optima_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_root: default_log_root(),
            data_dir: default_data_dir(),
            datasets_dir: default_datasets_dir(),
            optima_file: default_optima_file(),
        }
    }
}

fn default_log_root() -> PathBuf {
    PathBuf::from("logs")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_datasets_dir() -> PathBuf {
    PathBuf::from("datasets")
}

fn default_optima_file() -> String {
    "bbob_optima.csv".to_string()
}

/// Log decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Decoding threads; 0 uses one per core
    #[serde(default)]
    pub workers: usize,
    /// Only read logs whose file name starts with one of these
    #[serde(default)]
    pub run_prefixes: Vec<String>,
    #[serde(default)]
    pub columns: LogColumns,
}

/// Derived metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub aocc: AoccBounds,
    /// Restrict optimum lookup to these `function_instance` tokens
    #[serde(default)]
    pub functions: Option<Vec<String>>,
}

/// Named group of algorithms drawn together in comparison plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSet {
    pub name: String,
    pub algorithms: Vec<String>,
}

/// Cross-algorithm comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<String>,
    /// Blocks of the global comparison
    #[serde(default = "default_functions")]
    pub functions: Vec<String>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub global_post_hoc: PostHocPolicy,
    #[serde(default)]
    pub per_function_post_hoc: PostHocPolicy,
    #[serde(default = "default_plot_sets")]
    pub plot_sets: Vec<PlotSet>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            algorithms: default_algorithms(),
            functions: default_functions(),
            alpha: default_alpha(),
            global_post_hoc: PostHocPolicy::default(),
            per_function_post_hoc: PostHocPolicy::default(),
            plot_sets: default_plot_sets(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_algorithms() -> Vec<String> {
    strings(&["PSO", "SHADE", "PSO_RR", "PSO_GPGM", "PSO_NPGM", "PSO_PDM", "PSO_SRM"])
}

fn default_functions() -> Vec<String> {
    (1..=24).map(|i| format!("f{i:03}")).collect()
}

fn default_alpha() -> f64 {
    0.05
}

fn default_plot_sets() -> Vec<PlotSet> {
    let variants = ["PSO_GPGM", "PSO_NPGM", "PSO_PDM", "PSO_SRM"];
    [("PSO_RR", "PSO_RR"), ("SHADE", "SHADE"), ("PSO_Variants", "PSO")]
        .into_iter()
        .map(|(name, baseline)| PlotSet {
            name: name.to_string(),
            algorithms: std::iter::once(baseline).chain(variants).map(String::from).collect(),
        })
        .collect()
}

/// Rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self { enabled: true, width: default_width(), height: default_height() }
    }
}

fn bool_true() -> bool {
    true
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    768
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
paths:
  log_root: /srv/mahf/logs
  data_dir: ./out

ingest:
  workers: 4
  run_prefixes: ["1_", "2_"]

metrics:
  aocc:
    lower: 1.0e-6
    upper: 1.0e6

comparison:
  algorithms: [PSO, SHADE, PSO_RR]
  functions: [f001, f002]
  alpha: 0.01
  global_post_hoc: always
  plot_sets:
    - name: baseline
      algorithms: [PSO, SHADE]

plots:
  enabled: false
"#;

    #[test]
    fn test_parse_yaml_config() {
        let config = AnalysisConfig::from_yaml(SAMPLE_YAML, Path::new("analizar.yaml")).unwrap();
        assert_eq!(config.paths.log_root, PathBuf::from("/srv/mahf/logs"));
        assert_eq!(config.paths.optima_file, "bbob_optima.csv");
        assert_eq!(config.ingest.workers, 4);
        assert_eq!(config.ingest.columns, LogColumns::default());
        assert_eq!(config.metrics.aocc.lower, 1e-6);
        assert_eq!(config.comparison.global_post_hoc, PostHocPolicy::Always);
        assert_eq!(config.comparison.per_function_post_hoc, PostHocPolicy::WhenSignificant);
        assert!(!config.plots.enabled);
        assert_eq!(config.plots.width, 1024);
    }

    #[test]
    fn test_default_values() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.comparison.algorithms.len(), 7);
        assert_eq!(config.comparison.functions.first().map(String::as_str), Some("f001"));
        assert_eq!(config.comparison.functions.last().map(String::as_str), Some("f024"));
        assert_eq!(config.comparison.plot_sets.len(), 3);
        assert_eq!(config.comparison.plot_sets[2].algorithms[0], "PSO");
        assert_eq!(config.metrics.aocc, AoccBounds::default());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = AnalysisConfig::from_yaml("{}", Path::new("empty.yaml")).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.comparison.alpha = 1.5;
        assert!(matches!(config.validate(), Err(AnalizarError::ConfigValue { .. })));

        let mut config = AnalysisConfig::default();
        config.comparison.algorithms.truncate(2);
        config.comparison.plot_sets.clear();
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.comparison.plot_sets[0].algorithms.push("CMA-ES".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let err = AnalysisConfig::from_yaml("comparison: [", Path::new("broken.yaml")).unwrap_err();
        assert!(matches!(err, AnalizarError::ConfigParsing { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AnalysisConfig::from_file("/nonexistent/analizar.yaml"),
            Err(AnalizarError::ConfigNotFound { .. })
        ));
        assert_eq!(AnalysisConfig::load(None).unwrap(), AnalysisConfig::default());
    }
}
