//! ui
//!
//! Terminal output helpers for the CLI layer.

pub mod output;

pub use output::Verbosity;
