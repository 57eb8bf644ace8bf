//! Group summaries of the run table.
//!
//! Both summarisers partition runs by exact equality on a set of grouping
//! columns (observed combinations only, ordered by key) and require every
//! retained column to be constant within a group.

mod group;
mod process;
mod scalar;
mod stats;

pub use group::describe_group;
pub use process::{summarise_process, ProcessRow, ProcessSummary};
pub use scalar::{last_column, summarise_scalar, ScalarRow, ScalarSummary};
pub use stats::{reduce_columns, reduce_scalars, ScalarStats, SeriesStats, Stat};
