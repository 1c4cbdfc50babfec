//! Concurrent aggregation engine
//!
//! A [`WorkerPool`] runs `min(requested, shards)` workers over one shared
//! [`WorkQueue`]. Each worker counts a shard on the blocking pool and folds
//! the result into the [`Aggregator`]. The pool waits on the queue's drain
//! barrier before posting shutdown markers, so no worker can exit while a
//! shard is still in flight elsewhere.
//!
//! All state is created inside [`WorkerPool::run`] and dropped when it
//! returns; nothing survives between runs.

pub mod aggregator;
pub mod events;
pub mod queue;
pub mod state;
mod worker;

pub use aggregator::{AggregateSnapshot, Aggregator};
pub use events::{ConsoleEvents, EventSink, PoolEvent, TracingEvents};
pub use queue::{WorkQueue, Withdrawal};
pub use worker::WorkerReport;

use crate::corpus::Shard;
use crate::count::{ShardFailure, ShardProcessor};
use crate::error::{CountError, CountResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use worker::Worker;

/// Summary counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub merged: usize,
    pub failed: usize,
    pub lines: u64,
    pub tokens: u64,
    pub elapsed: Duration,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct PoolOutcome {
    pub aggregate: AggregateSnapshot,
    /// Sorted by shard name
    pub failures: Vec<ShardFailure>,
    pub stats: PoolStats,
}

pub struct WorkerPool {
    processor: ShardProcessor,
    events: Arc<dyn EventSink>,
    requested_workers: usize,
}

impl WorkerPool {
    pub fn new(
        processor: ShardProcessor,
        events: Arc<dyn EventSink>,
        requested_workers: usize,
    ) -> Self {
        Self {
            processor,
            events,
            requested_workers,
        }
    }

    /// Number of workers that will actually be spawned for `shard_count`
    /// shards.
    pub fn worker_count(&self, shard_count: usize) -> usize {
        self.requested_workers.min(shard_count)
    }

    /// Process every shard and return the merged result.
    ///
    /// Returns only after every shard has been merged or reported and every
    /// worker has terminated. Shard read failures are part of the outcome;
    /// an `Err` means the run itself is unusable.
    pub async fn run(&self, shards: Vec<Shard>) -> CountResult<PoolOutcome> {
        if self.requested_workers == 0 {
            return Err(CountError::InvalidConfiguration {
                field: "threads".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if shards.is_empty() {
            return Err(CountError::NoShards);
        }

        let started = Instant::now();
        let worker_count = self.worker_count(shards.len());
        let queue = Arc::new(WorkQueue::new(shards)?);
        let aggregator = Arc::new(Aggregator::new());

        info!(
            "Starting {} workers for {} shards ({} requested)",
            worker_count,
            queue.total(),
            self.requested_workers
        );

        let mut workers = JoinSet::new();
        let mut worker_ids = HashMap::with_capacity(worker_count);
        for id in 0..worker_count {
            let worker = Worker {
                id,
                queue: queue.clone(),
                aggregator: aggregator.clone(),
                processor: self.processor.clone(),
                events: self.events.clone(),
            };
            let handle = workers.spawn(worker.run());
            worker_ids.insert(handle.id(), id);
        }

        // Shutdown markers go out only once every shard is accounted for.
        // Workers are joined concurrently so a panicking one still releases
        // the barrier through `abort`.
        let mut reports = Vec::with_capacity(worker_count);
        let mut fatal: Option<CountError> = None;
        {
            let barrier = queue.wait_drained();
            tokio::pin!(barrier);
            let mut barrier_closed = false;

            loop {
                tokio::select! {
                    drained = &mut barrier, if !barrier_closed => {
                        barrier_closed = true;
                        match drained {
                            Ok(()) => {
                                debug!("Drain barrier closed, releasing {} workers", worker_count);
                                queue.close(worker_count).await;
                            }
                            Err(e) => debug!("Drain barrier abandoned: {}", e),
                        }
                    }
                    joined = workers.join_next_with_id() => match joined {
                        None => break,
                        Some(Ok((_, Ok(report)))) => reports.push(report),
                        Some(Ok((_, Err(e)))) => {
                            fatal.get_or_insert(e);
                        }
                        Some(Err(e)) => {
                            queue.abort().await;
                            // Ids come from our own spawns above.
                            let worker = worker_ids[&e.id()];
                            error!("Worker {} panicked: {}", worker, e);
                            fatal.get_or_insert(CountError::WorkerPanicked {
                                worker,
                                reason: e.to_string(),
                            });
                        }
                    },
                }
            }
        }

        if let Some(e) = fatal {
            error!("Worker pool failed: {}", e);
            return Err(e);
        }

        // Every worker has been joined, so this is the last handle.
        let aggregate = Arc::try_unwrap(aggregator)
            .map_err(|_| CountError::AggregatorShared)?
            .into_snapshot();

        let mut stats = PoolStats {
            workers: worker_count,
            ..Default::default()
        };
        let mut failures = Vec::new();
        for report in reports {
            stats.merged += report.merged;
            stats.failed += report.failures.len();
            stats.lines += report.lines;
            stats.tokens += report.tokens;
            failures.extend(report.failures);
        }
        failures.sort_by(|a, b| a.shard.cmp(&b.shard));
        stats.elapsed = started.elapsed();

        info!(
            "Processed {} shards ({} failed) in {:?}: {} tokens, {} distinct words",
            stats.merged + stats.failed,
            stats.failed,
            stats.elapsed,
            stats.tokens,
            aggregate.global.len()
        );

        Ok(PoolOutcome {
            aggregate,
            failures,
            stats,
        })
    }
}
