//! One counting run, end to end
//!
//! Wires a line source and event sink into a [`WorkerPool`], then assembles
//! the table from the frozen aggregate. A pipeline holds no state between
//! runs and can be reused.

use crate::corpus::{LineSource, Shard};
use crate::count::{ShardFailure, ShardProcessor};
use crate::error::CountResult;
use crate::output::{assemble, WordTable};
use crate::pool::{EventSink, PoolStats, WorkerPool};
use std::num::NonZeroUsize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: WordTable,
    /// Shards excluded from the table's counts, sorted by name
    pub failures: Vec<ShardFailure>,
    pub stats: PoolStats,
}

pub struct CountPipeline {
    source: Arc<dyn LineSource>,
    events: Arc<dyn EventSink>,
    threads: NonZeroUsize,
}

impl CountPipeline {
    pub fn new(
        source: Arc<dyn LineSource>,
        events: Arc<dyn EventSink>,
        threads: NonZeroUsize,
    ) -> Self {
        Self {
            source,
            events,
            threads,
        }
    }

    pub async fn run(&self, shards: Vec<Shard>) -> CountResult<RunReport> {
        // Columns come from the whole corpus, not just the shards that merge.
        let shard_names: Vec<String> = shards.iter().map(|s| s.display_name.clone()).collect();

        let pool = WorkerPool::new(
            ShardProcessor::new(self.source.clone()),
            self.events.clone(),
            self.threads.get(),
        );
        let outcome = pool.run(shards).await?;
        let table = assemble(&outcome.aggregate, &shard_names);

        Ok(RunReport {
            table,
            failures: outcome.failures,
            stats: outcome.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryLineSource, RecordingEvents};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pipeline_is_reusable() {
        let source = MemoryLineSource::new()
            .with_shard("a", "one two")
            .with_shard("b", "two three");
        let pipeline = CountPipeline::new(
            Arc::new(source),
            Arc::new(RecordingEvents::new()),
            NonZeroUsize::new(2).unwrap(),
        );
        let shards = vec![Shard::new("a", "a"), Shard::new("b", "b")];

        let first = pipeline.run(shards.clone()).await.unwrap();
        let second = pipeline.run(shards).await.unwrap();
        assert_eq!(first.table, second.table);
        assert_eq!(first.table.row("two").unwrap().count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_shard_keeps_its_column() {
        let source = MemoryLineSource::new()
            .with_shard("a", "one two")
            .with_failing_shard("b", "two three", 0);
        let pipeline = CountPipeline::new(
            Arc::new(source),
            Arc::new(RecordingEvents::new()),
            NonZeroUsize::new(2).unwrap(),
        );

        let report = pipeline
            .run(vec![Shard::new("b", "b"), Shard::new("a", "a")])
            .await
            .unwrap();
        assert_eq!(report.table.shard_columns, vec!["a", "b"]);
        assert_eq!(report.table.column("b"), Some(vec![0, 0]));
        assert_eq!(report.failures.len(), 1);
        assert!(report.table.row("three").is_none());
    }
}
