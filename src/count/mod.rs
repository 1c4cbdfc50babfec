//! Tokenizing and per-shard counting

pub mod processor;
pub mod tokenizer;

pub use processor::{ShardFailure, ShardOutcome, ShardProcessor, ShardTally};
pub use tokenizer::{count_line, tokenize};

use std::collections::HashMap;

/// Token → occurrence count
pub type WordCounts = HashMap<String, u64>;
