//! Per-shard counting
//!
//! A [`ShardProcessor`] turns one shard's line stream into a local frequency
//! table. Read failures are returned as [`ShardOutcome::Failed`] instead of
//! being propagated, so a single unreadable shard never stops the pool.

use super::tokenizer::count_line;
use super::WordCounts;
use crate::corpus::{LineSource, Shard};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Counts gathered from one fully read shard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardTally {
    pub counts: WordCounts,
    pub lines: u64,
    pub tokens: u64,
}

/// A shard that could not be read to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardFailure {
    pub shard: String,
    pub reason: String,
}

impl fmt::Display for ShardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error processing {}: {}", self.shard, self.reason)
    }
}

/// Result of processing one shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardOutcome {
    Counted(ShardTally),
    Failed(ShardFailure),
}

#[derive(Clone)]
pub struct ShardProcessor {
    source: Arc<dyn LineSource>,
}

impl ShardProcessor {
    pub fn new(source: Arc<dyn LineSource>) -> Self {
        Self { source }
    }

    /// Read and count every line of `shard`.
    ///
    /// Partial counts from a stream that fails mid-read are discarded.
    pub fn process(&self, shard: &Shard) -> ShardOutcome {
        let stream = match self.source.open(shard) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to open shard {}: {}", shard, e);
                return ShardOutcome::Failed(ShardFailure {
                    shard: shard.display_name.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let mut tally = ShardTally::default();
        for line in stream {
            match line {
                Ok(line) => {
                    tally.tokens += count_line(&line, &mut tally.counts);
                    tally.lines += 1;
                }
                Err(e) => {
                    warn!(
                        "Read of shard {} failed after {} lines: {}",
                        shard, tally.lines, e
                    );
                    return ShardOutcome::Failed(ShardFailure {
                        shard: shard.display_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            "Counted shard {}: {} lines, {} tokens, {} distinct",
            shard,
            tally.lines,
            tally.tokens,
            tally.counts.len()
        );
        ShardOutcome::Counted(tally)
    }
}
