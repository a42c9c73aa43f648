//! engine
//!
//! The sync engine: per-entity decisioning, diff planning, plan
//! application, and the run orchestrator.
//!
//! # Architecture
//!
//! - [`decision`] - classify what each entity needs, before any fetch
//! - [`plan`] - pure missing/stale/up-to-date/extra partitioning
//! - [`reconcile`] - the only code that mutates the target tree
//! - [`progress`] - structured events and cooperative cancellation
//! - [`runner`] - sequential orchestration, retry/backoff, completeness

pub mod decision;
pub mod plan;
pub mod progress;
pub mod reconcile;
pub mod runner;

pub use decision::{classify, EntityState, UpdateAction};
pub use plan::{build_plan, MatchedChild, ReconciliationPlan};
pub use progress::{CancelFlag, ChannelSink, CollectingSink, NullSink, ProgressEvent, ProgressSink};
pub use reconcile::{ReconcileOutcome, WriteFailure};
pub use runner::{EntityReport, EntityStatus, RunSummary, SyncRunner};
