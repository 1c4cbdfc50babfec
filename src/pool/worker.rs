//! Worker loop: withdraw, process, merge or report, repeat

use super::aggregator::Aggregator;
use super::events::{EventSink, PoolEvent};
use super::queue::{WorkQueue, Withdrawal};
use super::state::{apply_transition, WorkerState, WorkerTransition};
use crate::corpus::Shard;
use crate::count::{ShardFailure, ShardOutcome, ShardProcessor};
use crate::error::{CountError, CountResult};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// What one worker did before terminating
#[derive(Debug, Clone, Default)]
pub struct WorkerReport {
    pub worker: usize,
    pub merged: usize,
    pub failures: Vec<ShardFailure>,
    pub lines: u64,
    pub tokens: u64,
}

pub(crate) struct Worker {
    pub id: usize,
    pub queue: Arc<WorkQueue>,
    pub aggregator: Arc<Aggregator>,
    pub processor: ShardProcessor,
    pub events: Arc<dyn EventSink>,
}

impl Worker {
    /// Run until a shutdown marker is received. Any fatal error aborts the
    /// queue so the pool and the other workers stop waiting.
    pub async fn run(self) -> CountResult<WorkerReport> {
        let queue = self.queue.clone();
        let id = self.id;
        let result = self.work_loop().await;
        if let Err(e) = &result {
            error!("Worker {} aborting pool: {}", id, e);
            queue.abort().await;
        }
        result
    }

    async fn work_loop(self) -> CountResult<WorkerReport> {
        let mut report = WorkerReport {
            worker: self.id,
            ..Default::default()
        };
        let mut state = WorkerState::Running;

        loop {
            let shard = match self.queue.withdraw().await? {
                Withdrawal::PoolClosed => {
                    state = self.step(state, WorkerTransition::Close)?;
                    debug!(
                        "Worker {} {} after {} merges, {} failures",
                        self.id,
                        state,
                        report.merged,
                        report.failures.len()
                    );
                    return Ok(report);
                }
                Withdrawal::Shard(shard) => shard,
            };

            state = self.step(
                state,
                WorkerTransition::Withdraw {
                    shard: shard.display_name.clone(),
                },
            )?;
            self.events.emit(&PoolEvent::ShardStarted {
                shard: shard.display_name.clone(),
                worker: self.id,
            });

            let merged = match self.process(&shard).await? {
                ShardOutcome::Counted(tally) => {
                    state = self.step(state, WorkerTransition::Merge)?;
                    self.aggregator
                        .merge(&shard.display_name, tally.counts)
                        .await?;
                    report.merged += 1;
                    report.lines += tally.lines;
                    report.tokens += tally.tokens;
                    state = self.step(state, WorkerTransition::Done)?;
                    true
                }
                ShardOutcome::Failed(failure) => {
                    state = self.step(state, WorkerTransition::Fail)?;
                    self.events.emit(&PoolEvent::ShardFailed {
                        shard: failure.shard.clone(),
                        worker: self.id,
                        reason: failure.reason.clone(),
                    });
                    report.failures.push(failure);
                    false
                }
            };

            self.events.emit(&PoolEvent::ShardFinished {
                shard: shard.display_name,
                worker: self.id,
                merged,
            });
            let remaining = self.queue.complete().await;
            debug!(
                "Worker {} done with shard, {} of {} remaining",
                self.id,
                remaining,
                self.queue.total()
            );
        }
    }

    /// Read and count on the blocking pool so workers run in parallel.
    async fn process(&self, shard: &Shard) -> CountResult<ShardOutcome> {
        let processor = self.processor.clone();
        let shard = shard.clone();
        tokio::task::spawn_blocking(move || processor.process(&shard))
            .await
            .map_err(|e| CountError::WorkerPanicked {
                worker: self.id,
                reason: e.to_string(),
            })
    }

    fn step(&self, state: WorkerState, transition: WorkerTransition) -> CountResult<WorkerState> {
        let next = apply_transition(state, transition)?;
        trace!("Worker {} -> {}", self.id, next);
        Ok(next)
    }
}
