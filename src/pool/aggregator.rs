//! Shared aggregate state
//!
//! The global table and the per-shard table live behind a single lock and
//! change only through [`Aggregator::merge`], so no reader ever observes one
//! half of a merge.

use crate::count::WordCounts;
use crate::error::{CountError, CountResult};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Frozen view of the aggregate after a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSnapshot {
    pub global: WordCounts,
    pub per_shard: BTreeMap<String, WordCounts>,
}

#[derive(Default)]
pub struct Aggregator {
    state: Mutex<AggregateSnapshot>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one shard's counts into the global table and record them under
    /// `shard_name`.
    ///
    /// A name that has already been merged is rejected before anything is
    /// mutated.
    pub async fn merge(&self, shard_name: &str, counts: WordCounts) -> CountResult<()> {
        let mut guard = self.state.lock().await;
        let AggregateSnapshot { global, per_shard } = &mut *guard;

        if per_shard.contains_key(shard_name) {
            return Err(CountError::DuplicateShard {
                shard: shard_name.to_string(),
            });
        }

        for (word, count) in &counts {
            match global.get_mut(word) {
                Some(total) => *total += count,
                None => {
                    global.insert(word.clone(), *count);
                }
            }
        }

        let distinct = counts.len();
        let global_distinct = global.len();
        per_shard.insert(shard_name.to_string(), counts);
        drop(guard);

        // Never log while holding the lock.
        debug!(
            "Merged shard {} ({} distinct words, {} global)",
            shard_name, distinct, global_distinct
        );
        Ok(())
    }

    /// Take the final state once no other handle to the aggregator remains.
    pub fn into_snapshot(self) -> AggregateSnapshot {
        self.state.into_inner()
    }
}
