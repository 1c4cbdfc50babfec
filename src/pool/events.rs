//! Per-shard progress events
//!
//! Every shard produces `ShardStarted` followed by `ShardFinished`, both from
//! the worker that withdrew it. A shard that could not be read also produces
//! `ShardFailed` in between.

use std::io::Write;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    ShardStarted {
        shard: String,
        worker: usize,
    },
    ShardFailed {
        shard: String,
        worker: usize,
        reason: String,
    },
    ShardFinished {
        shard: String,
        worker: usize,
        merged: bool,
    },
}

impl PoolEvent {
    pub fn shard(&self) -> &str {
        match self {
            PoolEvent::ShardStarted { shard, .. }
            | PoolEvent::ShardFailed { shard, .. }
            | PoolEvent::ShardFinished { shard, .. } => shard,
        }
    }
}

/// Receives events from every worker concurrently
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PoolEvent);
}

/// Structured log records only; failures surface at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn emit(&self, event: &PoolEvent) {
        match event {
            PoolEvent::ShardStarted { shard, worker } => {
                info!(shard = %shard, worker, "Shard started");
            }
            PoolEvent::ShardFailed {
                shard,
                worker,
                reason,
            } => {
                warn!(shard = %shard, worker, reason = %reason, "Shard failed");
            }
            PoolEvent::ShardFinished {
                shard,
                worker,
                merged,
            } => {
                info!(shard = %shard, worker, merged, "Shard finished");
            }
        }
    }
}

/// `start <name>` / `finish <name>` lines on stdout and failure reports on
/// stderr, as consumed by scripts wrapping the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEvents;

impl EventSink for ConsoleEvents {
    fn emit(&self, event: &PoolEvent) {
        match event {
            PoolEvent::ShardStarted { shard, .. } => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "start {shard}");
                let _ = out.flush();
            }
            PoolEvent::ShardFinished { shard, .. } => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "finish {shard}");
                let _ = out.flush();
            }
            PoolEvent::ShardFailed { shard, reason, .. } => {
                eprintln!("Error processing {shard}: {reason}");
            }
        }
        debug!(?event, "Pool event");
    }
}
