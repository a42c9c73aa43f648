//! fetch::pipeline
//!
//! Batched concurrent fetch with per-item failure containment.
//!
//! # Architecture
//!
//! Items are partitioned into fixed-size batches. A whole batch is in
//! flight at once; the pipeline sleeps a pacing delay between batches as
//! backpressure against the remote source. A failed item is excluded from
//! the results and never aborts its batch or the pipeline. Retry across
//! whole-pipeline attempts is owned by the orchestrator, which re-invokes
//! [`fetch_all`] on the failed subset.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use super::source::{FetchedContent, SourceReference};
use super::transport::ContentTransport;
use crate::core::hash;

/// Statistics for one pipeline invocation. Always produced, even on
/// total failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub batches: usize,
    pub elapsed: Duration,
}

impl FetchStats {
    /// Fraction of items fetched successfully; 1.0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.successful as f64 / self.total as f64
    }
}

/// Result of one pipeline invocation.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Successfully fetched items, in input order.
    pub fetched: Vec<FetchedContent>,
    /// Items that failed, for the orchestrator's retry layer.
    pub failed: Vec<SourceReference>,
    pub stats: FetchStats,
}

/// Fetch every item, batched.
///
/// Item failures are contained per item; the outcome partitions inputs
/// into `fetched` and `failed` and always carries stats.
pub async fn fetch_all(
    transport: Arc<dyn ContentTransport>,
    items: Vec<SourceReference>,
    batch_size: usize,
    inter_batch_delay: Duration,
) -> FetchOutcome {
    let started = Instant::now();
    let total = items.len();
    let batch_size = batch_size.max(1);

    let mut slots: Vec<Option<Result<FetchedContent, SourceReference>>> =
        (0..total).map(|_| None).collect();
    let mut batches = 0usize;

    for (batch_index, batch) in items.chunks(batch_size).enumerate() {
        if batch_index > 0 && !inter_batch_delay.is_zero() {
            tokio::time::sleep(inter_batch_delay).await;
        }
        batches += 1;

        let mut in_flight = JoinSet::new();
        for (offset, reference) in batch.iter().cloned().enumerate() {
            let transport = Arc::clone(&transport);
            let slot = batch_index * batch_size + offset;
            in_flight.spawn(async move {
                let result = match transport.fetch(&reference.url).await {
                    Ok(body) => {
                        let digest = hash::digest(&body);
                        Ok(FetchedContent {
                            reference,
                            body,
                            hash: digest,
                        })
                    }
                    Err(_) => Err(reference),
                };
                (slot, result)
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            // A panicked task counts as a failed item below; its slot
            // stays empty.
            if let Ok((slot, result)) = joined {
                slots[slot] = Some(result);
            }
        }
    }

    let mut fetched = Vec::new();
    let mut failed = Vec::new();
    for (slot, outcome) in slots.into_iter().enumerate() {
        match outcome {
            Some(Ok(content)) => fetched.push(content),
            Some(Err(reference)) => failed.push(reference),
            None => failed.push(items[slot].clone()),
        }
    }

    let stats = FetchStats {
        total,
        successful: fetched.len(),
        failed: failed.len(),
        batches,
        elapsed: started.elapsed(),
    };
    FetchOutcome {
        fetched,
        failed,
        stats,
    }
}
