//! glyphsync
//!
//! Reconciles icon variant libraries against a versioned remote source.
//!
//! # Architecture
//!
//! - [`core`] - domain model: variant space, version graph, hashing,
//!   metadata, configuration
//! - [`fetch`] - source URLs, the transport seam, the batched pipeline
//! - [`tree`] - the target-tree adapter and its implementations
//! - [`engine`] - decisioning, diff planning, reconciliation, the runner
//! - [`cli`] / [`ui`] - the `gsync` command-line front end
//!
//! The engine mutates the target tree only through [`tree::TargetTree`],
//! one entity at a time, in the caller's order.

pub mod cli;
pub mod core;
pub mod engine;
pub mod fetch;
pub mod tree;
pub mod ui;
