//! Error types for the counting pipeline
//!
//! Shard-level read failures are not errors at this level: they are captured
//! as [`ShardFailure`](crate::count::ShardFailure) values and reported through
//! the event sink. Everything in [`CountError`] is fatal to a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CountError {
    // Coordination invariants
    #[error("Shard {shard} was merged more than once")]
    DuplicateShard { shard: String },

    #[error("Shard {shard} was withdrawn from the work queue twice")]
    ShardWithdrawnTwice { shard: String },

    #[error("Worker withdrew after all {markers} shutdown markers were delivered")]
    ExcessShutdownSignal { markers: usize },

    #[error("Worker pool was aborted before the queue drained")]
    PoolAborted,

    #[error("Worker {worker} panicked: {reason}")]
    WorkerPanicked { worker: usize, reason: String },

    #[error("Aggregator still shared after every worker terminated")]
    AggregatorShared,

    #[error(transparent)]
    InvalidWorkerState(#[from] crate::pool::state::StateError),

    // Input and configuration
    #[error("No shards were given to the worker pool")]
    NoShards,

    #[error("No shards ending in '{suffix}' found in {}", dir.display())]
    EmptyCorpus { dir: PathBuf, suffix: String },

    #[error("Input directory '{}' not found or is not a directory", dir.display())]
    InputNotDirectory { dir: PathBuf },

    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Unsupported output file '{}': extension must be .csv, .tsv, .json, .parquet or .arrow", path.display())]
    UnsupportedOutput { path: PathBuf },

    #[error("Failed to list {}", dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type CountResult<T> = Result<T, CountError>;

impl CountError {
    /// True for errors that indicate the worker/queue coordination itself is
    /// broken, as opposed to bad input or I/O at the edges.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            CountError::DuplicateShard { .. }
                | CountError::ShardWithdrawnTwice { .. }
                | CountError::ExcessShutdownSignal { .. }
                | CountError::WorkerPanicked { .. }
                | CountError::AggregatorShared
                | CountError::InvalidWorkerState(_)
        )
    }
}
