//! Nonparametric rank tests for matched benchmark comparisons.
//!
//! All procedures take a blocks × treatments matrix (rows are benchmark
//! functions or instances, columns are algorithms) and rank within each
//! block, so results are invariant to the scale of the measurement:
//! - Friedman rank-sum test for any difference among treatments
//! - Nemenyi pairwise post-hoc p-values
//! - Mean and fractional (percentile) ranks per treatment

pub mod distribution;
pub mod friedman;
pub mod nemenyi;
pub mod rank;

pub use friedman::{friedman, FriedmanResult};
pub use nemenyi::nemenyi;
pub use rank::{average_ranks, fractional_ranks, mean_ranks};
