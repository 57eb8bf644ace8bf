//! Error types with actionable diagnostics.
//!
//! Every variant carries the run key, column or group that triggered it so
//! an upstream labelling or data problem can be traced without rerunning the
//! pipeline under a debugger.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analizar operations.
pub type Result<T> = std::result::Result<T, AnalizarError>;

/// Errors that can occur while ingesting, summarising or comparing results.
#[derive(Error, Debug)]
pub enum AnalizarError {
    /// Configuration file not found at expected path.
    #[error("Configuration file not found: {path}\n  → Create a config file or use --config to specify a different path")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file has invalid syntax.
    #[error("Invalid configuration syntax in {path}:\n  {message}\n  → Check YAML syntax at the indicated line")]
    ConfigParsing { path: PathBuf, message: String },

    /// Configuration value is invalid.
    #[error("Invalid configuration value for '{field}': {message}\n  → {suggestion}")]
    ConfigValue { field: String, message: String, suggestion: String },

    /// A run key does not decompose into `run_x_function_instance_dimension`.
    #[error("Malformed run key '{key}': {reason}\n  → Expected five underscore-separated fields, e.g. '3_PSO_f001_i01_d10'")]
    MalformedKey { key: String, reason: String },

    /// A function id belongs to none of the five BBOB function groups.
    #[error("Function '{function}' in run '{key}' belongs to no function group\n  → Only BBOB functions f001 to f024 are grouped")]
    UnknownFunction { function: String, key: String },

    /// A decoded log lacks a required column.
    #[error("Log '{key}' has no column '{column}'\n  → Check the log column names in the ingest section of the config")]
    MissingLogColumn { column: String, key: String },

    /// An integer column holds a null entry.
    #[error("Log '{key}' column '{column}' has no value at entry {index}\n  → Step axis columns must be logged at every entry")]
    MissingValue { column: String, key: String, index: usize },

    /// An integer column holds a fractional or non-finite entry.
    #[error("Log '{key}' column '{column}' has non-integer value {value} at entry {index}\n  → Step axis columns must hold whole counts")]
    NonIntegerValue { column: String, key: String, index: usize, value: f64 },

    /// Trajectories of one run disagree in length.
    #[error("Run '{key}': column '{column}' has {actual} entries, step axis has {expected}\n  → All logged columns of a run must share one step axis")]
    LengthMismatch { key: String, column: String, expected: usize, actual: usize },

    /// No reference optimum matches a run key.
    #[error("No reference optimum matches run '{key}'\n  → Add the function/instance to the optimum table or widen the function filter")]
    MissingReference { key: String },

    /// The reference optimum table has an unusable row.
    #[error("Malformed optimum reference {path} at row {row}: {message}\n  → Rows must read '<suite>_<function>_<instance>[_...],<optimum>'")]
    MalformedReference { path: PathBuf, row: usize, message: String },

    /// A derived column was requested before its dependency exists.
    #[error("Cannot compute {derived} for run '{key}': column {dependency} is missing\n  → Compute {dependency} first")]
    MissingDependency { derived: String, dependency: String, key: String },

    /// A trajectory needed for a reduction is empty.
    #[error("Column '{column}' of run '{key}' is empty\n  → Check the run log for entries")]
    EmptySeries { column: String, key: String },

    /// A retained column varies within one group.
    #[error("Column '{column}' has inconsistent values within group {group}: {values:?}\n  → Fix the upstream labels or add '{column}' to the grouping keys")]
    GroupInconsistency { column: String, group: String, values: Vec<String> },

    /// Trajectories within one group cannot be stacked.
    #[error("Column '{column}' in group {group} has length {actual}, expected {expected}\n  → All runs of a group must log the same steps")]
    RaggedGroup { column: String, group: String, expected: usize, actual: usize },

    /// The blocks × treatments matrix lacks or duplicates a cell.
    #[error("Expected exactly one row for treatment '{treatment}' in block '{block}', found {found}\n  → Experiment data is incomplete or duplicated")]
    MissingCombination { treatment: String, block: String, found: usize },

    /// Not enough treatments or blocks for a statistical test.
    #[error("Insufficient data for {test}: {message}")]
    InsufficientData { test: String, message: String },

    /// A log file could not be decoded.
    #[error("Failed to decode log {path}: {message}\n  → The file must be a CBOR document with 'names' and 'entries'")]
    Decode { path: PathBuf, message: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Columnar storage error.
    #[error("Storage error: {context}: {message}")]
    Storage { context: String, message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Plot rendering failed.
    #[error("Plot error: {message}\n  → Rerun with --no-plots to skip rendering")]
    Plot { message: String },

    /// Generic error for unexpected conditions.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AnalizarError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create a storage error with context.
    pub fn storage(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Storage { context: context.into(), message: message.to_string() }
    }

    /// Check if this error reflects a structural problem in the experiment data.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedKey { .. }
                | Self::UnknownFunction { .. }
                | Self::MissingLogColumn { .. }
                | Self::MissingValue { .. }
                | Self::NonIntegerValue { .. }
                | Self::LengthMismatch { .. }
                | Self::MissingReference { .. }
                | Self::MalformedReference { .. }
                | Self::EmptySeries { .. }
                | Self::GroupInconsistency { .. }
                | Self::RaggedGroup { .. }
                | Self::MissingCombination { .. }
        )
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "E001",
            Self::ConfigParsing { .. } => "E002",
            Self::ConfigValue { .. } => "E003",
            Self::MalformedKey { .. } => "E100",
            Self::UnknownFunction { .. } => "E101",
            Self::MissingLogColumn { .. } => "E102",
            Self::MissingValue { .. } => "E103",
            Self::NonIntegerValue { .. } => "E105",
            Self::LengthMismatch { .. } => "E104",
            Self::MissingReference { .. } => "E110",
            Self::MalformedReference { .. } => "E111",
            Self::MissingDependency { .. } => "E120",
            Self::EmptySeries { .. } => "E121",
            Self::GroupInconsistency { .. } => "E130",
            Self::RaggedGroup { .. } => "E131",
            Self::MissingCombination { .. } => "E140",
            Self::InsufficientData { .. } => "E141",
            Self::Decode { .. } => "E050",
            Self::Io { .. } => "E051",
            Self::Storage { .. } => "E052",
            Self::Serialization { .. } => "E053",
            Self::Plot { .. } => "E060",
            Self::Internal { .. } => "E999",
        }
    }
}
