//! Shared infrastructure for the analizar tools.
//!
//! Holds the error type every stage of the benchmark analysis pipeline
//! reports through, so that the CLI can render one consistent diagnostic
//! regardless of which crate raised it.

pub mod error;

pub use error::{AnalizarError, Result};
