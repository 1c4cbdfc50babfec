//! Whitespace tokenizer with full Unicode lowercasing

use super::WordCounts;

/// Split `line` on runs of Unicode whitespace and lowercase each token.
pub fn tokenize(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split_whitespace().map(str::to_lowercase)
}

/// Fold every token of `line` into `counts`, returning how many were seen.
pub fn count_line(line: &str, counts: &mut WordCounts) -> u64 {
    let mut seen = 0;
    for token in tokenize(line) {
        *counts.entry(token).or_insert(0) += 1;
        seen += 1;
    }
    seen
}
