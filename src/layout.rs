//! On-disk layout of logs, tables, reports and plots.

use std::path::{Path, PathBuf};

use crate::config::PathsConfig;

/// Resolves every artifact path of the pipeline from a few roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub log_root: PathBuf,
    pub data_dir: PathBuf,
    pub datasets_dir: PathBuf,
    pub optima_file: String,
}

impl Layout {
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            log_root: paths.log_root.clone(),
            data_dir: paths.data_dir.clone(),
            datasets_dir: paths.datasets_dir.clone(),
            optima_file: paths.optima_file.clone(),
        }
    }

    /// Batch discriminator, e.g. `PSO_d10`.
    pub fn dataset(algorithm: &str, dimension: &str) -> String {
        format!("{algorithm}_{dimension}")
    }

    /// Directory holding the CBOR logs of one batch.
    pub fn log_dir(&self, algorithm: &str, dimension: &str) -> PathBuf {
        self.log_root.join(algorithm).join(dimension)
    }

    pub fn optima_path(&self) -> PathBuf {
        self.datasets_dir.join(&self.optima_file)
    }

    /// Full run table of a batch.
    pub fn full_table(&self, dataset: &str) -> PathBuf {
        self.data_dir.join("dataframes").join(format!("{dataset}_full.feather"))
    }

    pub fn analysis_dir(&self, dataset: &str) -> PathBuf {
        self.data_dir.join("analysis").join(dataset)
    }

    pub fn process_summary(&self, dataset: &str, name: &str) -> PathBuf {
        self.analysis_dir(dataset)
            .join("dataframes")
            .join(format!("{dataset}_{name}_process_summaries.feather"))
    }

    pub fn scalar_summary(&self, dataset: &str, name: &str) -> PathBuf {
        self.analysis_dir(dataset)
            .join("dataframes")
            .join(format!("{dataset}_{name}_summaries.feather"))
    }

    pub fn summary_csv(&self, dataset: &str, name: &str) -> PathBuf {
        self.analysis_dir(dataset)
            .join("descriptive")
            .join(dataset)
            .join(format!("{dataset}_{name}_summaries.csv"))
    }

    pub fn plot_dir(&self, dataset: &str) -> PathBuf {
        self.analysis_dir(dataset).join("plots").join(dataset)
    }

    pub fn comparison_dir(&self, dimension: &str) -> PathBuf {
        self.data_dir.join("comparison").join(dimension)
    }

    /// Report of the global comparison, or of one function when given.
    pub fn comparison_report(&self, dimension: &str, function: Option<&str>) -> PathBuf {
        let name = match function {
            Some(f) => format!("comparison_{dimension}_{f}.json"),
            None => format!("comparison_{dimension}.json"),
        };
        self.comparison_dir(dimension).join(name)
    }

    /// Critical-difference diagram next to its report.
    pub fn critical_difference(&self, dimension: &str, function: Option<&str>) -> PathBuf {
        let name = match function {
            Some(f) => format!("crd_{dimension}_{f}.png"),
            None => format!("crd_{dimension}.png"),
        };
        self.comparison_dir(dimension).join(name)
    }
}

/// `dir/name.png`.
pub fn png(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.png"))
}
