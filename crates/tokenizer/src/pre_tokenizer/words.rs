//! Word-frequency extraction.
//!
//! Builds the training word table with exactly the normalization and
//! splitting rules the tokenizer uses at encode time.

use super::{Normalizer, Splitter};
use ahash::AHashMap;
use compact_str::CompactString;
use rayon::prelude::*;
use shabd_training::WordTable;

/// Pre-token frequencies of a corpus.
#[derive(Debug, Clone, Default)]
pub struct WordCounts {
    table: WordTable,
}

impl WordCounts {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the pre-tokens of every line.
    ///
    /// Lines are normalized and split in parallel when `parallel` is set;
    /// the resulting table is the same either way.
    pub fn from_lines<S>(
        lines: &[S],
        normalizer: &Normalizer,
        splitter: &Splitter,
        parallel: bool,
    ) -> Self
    where
        S: AsRef<str> + Sync,
    {
        let count_line = |line: &S| {
            let mut counts: AHashMap<CompactString, u64> = AHashMap::new();
            let normalized = normalizer.normalize(line.as_ref());
            splitter.for_each_pre_token(&normalized, |piece| {
                *counts.entry(CompactString::new(piece)).or_insert(0) += 1;
            });
            counts
        };

        let merge = |mut acc: AHashMap<CompactString, u64>, counts: AHashMap<CompactString, u64>| {
            for (word, count) in counts {
                *acc.entry(word).or_insert(0) += count;
            }
            acc
        };

        let counts = if parallel {
            lines.par_iter().map(count_line).reduce(AHashMap::new, merge)
        } else {
            lines.iter().map(count_line).fold(AHashMap::new(), merge)
        };

        Self {
            table: counts.into_iter().collect(),
        }
    }

    /// Count the pre-tokens of one more line.
    pub fn add_line(&mut self, line: &str, normalizer: &Normalizer, splitter: &Splitter) {
        let normalized = normalizer.normalize(line);
        let table = &mut self.table;
        splitter.for_each_pre_token(&normalized, |piece| {
            *table.entry(CompactString::new(piece)).or_insert(0) += 1;
        });
    }

    /// Number of distinct pre-tokens.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Total pre-token occurrences.
    pub fn total(&self) -> u64 {
        self.table
            .values()
            .fold(0u64, |acc, &count| acc.saturating_add(count))
    }

    /// Occurrences of one pre-token.
    pub fn get(&self, word: &str) -> Option<u64> {
        self.table.get(word).copied()
    }

    pub fn table(&self) -> &WordTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut WordTable {
        &mut self.table
    }

    pub fn into_table(self) -> WordTable {
        self.table
    }
}
