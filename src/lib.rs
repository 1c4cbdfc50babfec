//! # wordshard
//!
//! Counts word frequencies across a directory of gzip-compressed text shards
//! and produces one table: a global count per word plus one column per
//! shard.
//!
//! ## Usage
//!
//! ```bash
//! wordshard <input_dir> <output.csv|.tsv|.json|.parquet|.arrow> [threads]
//! ```
//!
//! ## Modules
//!
//! - `config` - TOML and environment configuration
//! - `corpus` - Shard discovery and line-stream providers
//! - `count` - Tokenizer and per-shard counting
//! - `pool` - Work queue, aggregator, and worker pool
//! - `output` - Deterministic table assembly and serialization
//! - `pipeline` - One run wired end to end
//! - `testing` - In-memory sources and event recording for tests
pub mod config;
pub mod corpus;
pub mod count;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod pool;

pub mod testing;

pub use error::{CountError, CountResult};
