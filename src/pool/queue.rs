//! Shared work queue with a drain barrier and counted shutdown
//!
//! The queue is filled once, before any worker starts. Shutdown is two-phase:
//! the pool first waits on [`WorkQueue::wait_drained`] until every enqueued
//! shard has been merged or reported as failed, and only then posts one
//! shutdown marker per worker with [`WorkQueue::close`]. A worker that finds
//! the queue empty before that point blocks instead of exiting.

use crate::corpus::Shard;
use crate::error::{CountError, CountResult};
use std::collections::{HashSet, VecDeque};
use tokio::sync::{Mutex, Notify};
use tracing::debug;

/// What a worker gets back from [`WorkQueue::withdraw`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Withdrawal {
    Shard(Shard),
    PoolClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueuePhase {
    Draining,
    ShuttingDown,
    Aborted,
}

#[derive(Debug)]
struct QueueState {
    pending: VecDeque<Shard>,
    issued: HashSet<String>,
    /// Shards withdrawn or pending that have not been marked complete
    unfinished: usize,
    markers_posted: usize,
    markers_left: usize,
    phase: QueuePhase,
}

pub struct WorkQueue {
    state: Mutex<QueueState>,
    changed: Notify,
    total: usize,
}

impl WorkQueue {
    /// Create a queue holding every shard of the corpus.
    ///
    /// Display names double as output columns, so two shards sharing one
    /// are rejected up front.
    pub fn new(shards: Vec<Shard>) -> CountResult<Self> {
        let mut names = HashSet::with_capacity(shards.len());
        for shard in &shards {
            if !names.insert(shard.display_name.as_str()) {
                return Err(CountError::DuplicateShard {
                    shard: shard.display_name.clone(),
                });
            }
        }

        let total = shards.len();
        Ok(Self {
            state: Mutex::new(QueueState {
                pending: shards.into(),
                issued: HashSet::with_capacity(total),
                unfinished: total,
                markers_posted: 0,
                markers_left: 0,
                phase: QueuePhase::Draining,
            }),
            changed: Notify::new(),
            total,
        })
    }

    /// Number of shards the queue was created with
    pub fn total(&self) -> usize {
        self.total
    }

    /// Take the next shard, or wait until one is available or a shutdown
    /// marker has been posted.
    pub async fn withdraw(&self) -> CountResult<Withdrawal> {
        loop {
            // Register for wake-ups before inspecting state so a notify
            // between the check and the await is not lost.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;

                if state.phase == QueuePhase::Aborted {
                    return Ok(Withdrawal::PoolClosed);
                }

                if let Some(shard) = state.pending.pop_front() {
                    if !state.issued.insert(shard.display_name.clone()) {
                        return Err(CountError::ShardWithdrawnTwice {
                            shard: shard.display_name,
                        });
                    }
                    return Ok(Withdrawal::Shard(shard));
                }

                if state.phase == QueuePhase::ShuttingDown {
                    if state.markers_left == 0 {
                        return Err(CountError::ExcessShutdownSignal {
                            markers: state.markers_posted,
                        });
                    }
                    state.markers_left -= 1;
                    return Ok(Withdrawal::PoolClosed);
                }
            }

            notified.await;
        }
    }

    /// Record that one withdrawn shard has been merged or reported,
    /// returning how many shards are still unfinished.
    pub async fn complete(&self) -> usize {
        let mut state = self.state.lock().await;
        state.unfinished = state.unfinished.saturating_sub(1);
        if state.unfinished == 0 {
            self.changed.notify_waiters();
        }
        state.unfinished
    }

    /// Wait until every enqueued shard has completed.
    pub async fn wait_drained(&self) -> CountResult<()> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.state.lock().await;
                if state.phase == QueuePhase::Aborted {
                    return Err(CountError::PoolAborted);
                }
                if state.unfinished == 0 {
                    return Ok(());
                }
            }

            notified.await;
        }
    }

    /// Post `markers` shutdown markers, each delivered to exactly one
    /// withdraw. Only valid after the queue has drained.
    pub async fn close(&self, markers: usize) {
        let mut state = self.state.lock().await;
        if state.phase == QueuePhase::Aborted {
            return;
        }
        state.phase = QueuePhase::ShuttingDown;
        state.markers_posted += markers;
        state.markers_left += markers;
        debug!("Posted {} shutdown markers", markers);
        self.changed.notify_waiters();
    }

    /// Release every waiter; used when a worker hits a fatal error.
    pub async fn abort(&self) {
        let mut state = self.state.lock().await;
        state.phase = QueuePhase::Aborted;
        self.changed.notify_waiters();
    }
}
