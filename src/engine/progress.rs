//! engine::progress
//!
//! Structured progress events and cooperative cancellation.
//!
//! The orchestrator pushes events through a [`ProgressSink`] and polls a
//! [`CancelFlag`] at entity boundaries. Both are externally owned; the
//! engine never blocks on a consumer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use super::decision::UpdateAction;
use crate::core::types::IconName;
use crate::fetch::FetchStats;

/// One progress event.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    RunStarted {
        total: usize,
    },
    EntityStarted {
        entity: IconName,
        index: usize,
        total: usize,
    },
    EntityDecided {
        entity: IconName,
        action: UpdateAction,
    },
    /// One whole fetch-pipeline attempt finished.
    FetchAttempt {
        entity: IconName,
        attempt: u32,
        stats: FetchStats,
    },
    /// Emitted periodically during a long backoff wait so an observer does
    /// not perceive the run as hung.
    RetryCooldown {
        entity: IconName,
        attempt: u32,
        remaining: Duration,
    },
    EntityCompleted {
        entity: IconName,
        written: usize,
        completed: usize,
        total: usize,
    },
    Warning {
        entity: IconName,
        message: String,
    },
    RunFinished {
        completed: usize,
        failed: usize,
        total: usize,
        cancelled: bool,
    },
}

/// Consumes progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events over a tokio channel; a dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

/// Buffers events for test assertions.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Cooperative cancellation flag, polled at entity boundaries only: an
/// in-flight batch always completes first.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
