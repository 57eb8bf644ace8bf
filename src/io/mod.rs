//! Reading run logs and reading/writing derived tables.

mod export;
mod log;
mod store;

pub use export::write_scalar_csv;
pub use log::{decode_log, list_logs, read_log_dir, write_log, LogTable, LOG_EXTENSION};
pub use store::{
    read_process_summary, read_run_table, read_scalar_summary, write_process_summary,
    write_run_table, write_scalar_summary,
};
