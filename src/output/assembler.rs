//! Deterministic table assembly
//!
//! Row and column order depend only on the words and shard names, never on
//! the order in which shards were processed.

use crate::pool::AggregateSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub word: String,
    pub count: u64,
    /// One entry per shard column, in column order
    pub shard_counts: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTable {
    /// Shard display names, ascending
    pub shard_columns: Vec<String>,
    /// Rows ascending by word
    pub rows: Vec<OutputRow>,
}

impl WordTable {
    /// `word`, `count`, then one name per shard column
    pub fn header(&self) -> Vec<&str> {
        let mut header = Vec::with_capacity(self.shard_columns.len() + 2);
        header.push("word");
        header.push("count");
        header.extend(self.shard_columns.iter().map(String::as_str));
        header
    }

    pub fn row(&self, word: &str) -> Option<&OutputRow> {
        self.rows
            .binary_search_by(|row| row.word.as_str().cmp(word))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// All values of one shard column, in row order
    pub fn column(&self, shard: &str) -> Option<Vec<u64>> {
        let idx = self.shard_columns.iter().position(|c| c == shard)?;
        Some(self.rows.iter().map(|row| row.shard_counts[idx]).collect())
    }
}

/// Build the final table from a frozen aggregate.
///
/// `shard_names` should be every discovered shard, including ones that
/// failed: each gets a column, all zeros if it has no per-shard entry.
pub fn assemble<S: AsRef<str>>(aggregate: &AggregateSnapshot, shard_names: &[S]) -> WordTable {
    let mut shard_columns: Vec<String> = shard_names
        .iter()
        .map(|name| name.as_ref().to_string())
        .collect();
    shard_columns.sort();
    shard_columns.dedup();

    let per_shard: Vec<_> = shard_columns
        .iter()
        .map(|name| aggregate.per_shard.get(name))
        .collect();

    let mut words: Vec<(&String, &u64)> = aggregate.global.iter().collect();
    words.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let rows = words
        .into_iter()
        .map(|(word, count)| OutputRow {
            word: word.clone(),
            count: *count,
            shard_counts: per_shard
                .iter()
                .map(|counts| {
                    counts
                        .and_then(|c| c.get(word))
                        .copied()
                        .unwrap_or(0)
                })
                .collect(),
        })
        .collect();

    WordTable {
        shard_columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::WordCounts;

    fn counts(pairs: &[(&str, u64)]) -> WordCounts {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    fn snapshot(shards: &[(&str, WordCounts)]) -> AggregateSnapshot {
        let mut aggregate = AggregateSnapshot::default();
        for (name, local) in shards {
            for (word, count) in local {
                *aggregate.global.entry(word.clone()).or_insert(0) += count;
            }
            aggregate.per_shard.insert(name.to_string(), local.clone());
        }
        aggregate
    }

    #[test]
    fn test_assemble_sorts_rows_and_columns() {
        let aggregate = snapshot(&[
            ("file2", counts(&[("world", 1), ("python", 1)])),
            ("file1", counts(&[("hello", 2), ("world", 1)])),
            ("file3", counts(&[("python", 2), ("hello", 1)])),
        ]);

        let table = assemble(&aggregate, &["file3", "file1", "file2"]);
        assert_eq!(
            table.header(),
            vec!["word", "count", "file1", "file2", "file3"]
        );
        let words: Vec<_> = table.rows.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["hello", "python", "world"]);
        assert_eq!(table.row("hello").unwrap().shard_counts, vec![2, 0, 1]);
        assert_eq!(table.row("python").unwrap().count, 3);
        assert_eq!(table.row("world").unwrap().shard_counts, vec![1, 1, 0]);
    }

    #[test]
    fn test_missing_shard_renders_zero_column() {
        let aggregate = snapshot(&[("a", counts(&[("x", 1)]))]);
        let table = assemble(&aggregate, &["b", "a"]);
        assert_eq!(table.shard_columns, vec!["a", "b"]);
        assert_eq!(table.column("b"), Some(vec![0]));
        assert_eq!(table.column("a"), Some(vec![1]));
        assert_eq!(table.column("c"), None);
    }

    #[test]
    fn test_rows_use_byte_order() {
        let aggregate = snapshot(&[("a", counts(&[("zebra", 1), ("Éclair", 1), ("apple", 1)]))]);
        let table = assemble(&aggregate, &["a"]);
        let words: Vec<_> = table.rows.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["apple", "zebra", "Éclair"]);
    }

    #[test]
    fn test_empty_aggregate_keeps_columns() {
        let table = assemble(&AggregateSnapshot::default(), &["only"]);
        assert!(table.rows.is_empty());
        assert_eq!(table.header(), vec!["word", "count", "only"]);
    }
}
