//! Post-processing for metaheuristic benchmark runs.
//!
//! The pipeline turns per-run CBOR logs into a run table, derives distance
//! and AOCC metrics against known optima, summarises runs per group, and
//! ranks algorithms with Friedman and Nemenyi tests.
//!
//! ```text
//! logs/<algorithm>/<dimension>/*.cbor
//!   -> convert  -> data/dataframes/<dataset>_full.feather
//!   -> analyse  -> data/analysis/<dataset>/...
//!   -> compare  -> data/comparison/<dimension>/comparison_<dimension>.json
//! ```

pub mod cli;
pub mod compare;
pub mod config;
pub mod io;
pub mod layout;
pub mod metrics;
pub mod plot;
pub mod runs;
pub mod summary;

pub use analizar_common::{AnalizarError, Result};
pub use analizar_stats as stats;
