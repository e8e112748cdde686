//! Pair counting for BPE training.
//!
//! This module keeps the global pair counts and an inverted index from each
//! pair to the words that contain it, so a merge only revisits the words it
//! actually touches. Initial counting can run in parallel.

use super::seed::WordTable;
use ahash::{AHashMap, AHashSet};
use shabd_core::encoding::replace_pair;
use shabd_core::{Pair, Result, TokenizerError, Vocabulary};

/// Upper bound on the frequency-weighted number of pair occurrences.
///
/// Every pair count is at most this total, so counts and merge deltas
/// always fit in an `i64`.
const MAX_PAIR_MASS: u64 = i64::MAX as u64;

/// Counter for BPE pair frequencies over a fixed set of words.
#[derive(Debug, Default)]
pub struct PairCounter {
    /// Word -> current symbol sequence (as token IDs)
    words: Vec<Vec<u32>>,
    /// Word -> frequency count
    word_counts: Vec<u64>,
    /// Pair -> frequency-weighted count
    pair_counts: AHashMap<Pair, u64>,
    /// Pair -> indices of the words containing it
    where_to_update: AHashMap<Pair, AHashSet<usize>>,
    /// Sum over words of frequency x adjacent pairs
    pair_mass: u64,
}

impl PairCounter {
    /// Create a new pair counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split every word of the table into single-character symbols.
    ///
    /// Words with a zero count are dropped. Every character must already be
    /// in the vocabulary.
    pub fn from_word_table(table: &WordTable, vocab: &Vocabulary) -> Result<Self> {
        let mut counter = Self::new();
        let mut buf = [0u8; 4];

        for (word, &count) in table {
            if count == 0 {
                continue;
            }
            let symbols = word
                .chars()
                .map(|ch| {
                    let symbol = ch.encode_utf8(&mut buf);
                    vocab
                        .get_id(symbol)
                        .ok_or_else(|| TokenizerError::UnknownSymbol(symbol.to_string()))
                })
                .collect::<Result<Vec<u32>>>()?;
            counter.add_word(symbols, count)?;
        }

        Ok(counter)
    }

    /// Add a word given as symbol ids.
    ///
    /// Fails if the frequency-weighted pair total would exceed `i64::MAX`.
    pub fn add_word(&mut self, symbols: Vec<u32>, count: u64) -> Result<()> {
        let pairs = symbols.len().saturating_sub(1) as u64;
        self.pair_mass = count
            .checked_mul(pairs)
            .and_then(|mass| mass.checked_add(self.pair_mass))
            .filter(|&mass| mass <= MAX_PAIR_MASS && count <= MAX_PAIR_MASS)
            .ok_or_else(|| {
                TokenizerError::Training(format!(
                    "word frequency {} over {} pairs is too large to count",
                    count, pairs
                ))
            })?;

        self.words.push(symbols);
        self.word_counts.push(count);
        Ok(())
    }

    /// Count all pairs in parallel.
    ///
    /// This returns a map of pair -> frequency count across all words.
    pub fn count_pairs_parallel(&self) -> AHashMap<Pair, u64> {
        use rayon::prelude::*;

        self.words
            .par_iter()
            .zip(self.word_counts.par_iter())
            .map(|(word, &count)| {
                let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();
                for window in word.windows(2) {
                    *pair_counts.entry((window[0], window[1])).or_insert(0) += count;
                }
                pair_counts
            })
            .reduce(AHashMap::new, |mut acc, pair_counts| {
                for (pair, count) in pair_counts {
                    *acc.entry(pair).or_insert(0) += count;
                }
                acc
            })
    }

    /// Count all pairs sequentially.
    pub fn count_pairs_sequential(&self) -> AHashMap<Pair, u64> {
        let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();

        for (word, &count) in self.words.iter().zip(self.word_counts.iter()) {
            for window in word.windows(2) {
                *pair_counts.entry((window[0], window[1])).or_insert(0) += count;
            }
        }

        pair_counts
    }

    /// Compute pair counts and the inverted index from the current words.
    pub fn build_index(&mut self, parallel: bool) {
        self.pair_counts = if parallel {
            self.count_pairs_parallel()
        } else {
            self.count_pairs_sequential()
        };

        self.where_to_update.clear();
        for (idx, word) in self.words.iter().enumerate() {
            for window in word.windows(2) {
                self.where_to_update
                    .entry((window[0], window[1]))
                    .or_default()
                    .insert(idx);
            }
        }
    }

    /// Current pair counts.
    pub fn pair_counts(&self) -> &AHashMap<Pair, u64> {
        &self.pair_counts
    }

    /// Current count of one pair.
    pub fn count(&self, pair: Pair) -> u64 {
        self.pair_counts.get(&pair).copied().unwrap_or(0)
    }

    /// Indices of the words that currently contain a pair.
    pub fn words_containing(&self, pair: Pair) -> Option<&AHashSet<usize>> {
        self.where_to_update.get(&pair)
    }

    /// Merge a pair in every word that contains it.
    ///
    /// Only words listed in the inverted index are rewritten. Returns each
    /// pair whose count changed with its new count; zero means the pair no
    /// longer occurs anywhere.
    pub fn merge_pair(&mut self, pair: Pair, new_token_id: u32) -> Vec<(Pair, u64)> {
        let mut affected: Vec<usize> = match self.where_to_update.remove(&pair) {
            Some(set) => set.into_iter().collect(),
            None => return Vec::new(),
        };
        affected.sort_unstable();

        let mut deltas: AHashMap<Pair, i64> = AHashMap::new();

        for idx in affected {
            let freq = self.word_counts[idx] as i64;
            let word = &mut self.words[idx];

            let before = pair_occurrences(word);
            replace_pair(word, pair, new_token_id);
            let after = pair_occurrences(word);

            for (&p, &n) in &before {
                *deltas.entry(p).or_insert(0) -= n as i64 * freq;
                if p != pair && !after.contains_key(&p) {
                    if let Some(set) = self.where_to_update.get_mut(&p) {
                        set.remove(&idx);
                        if set.is_empty() {
                            self.where_to_update.remove(&p);
                        }
                    }
                }
            }
            for (&p, &n) in &after {
                *deltas.entry(p).or_insert(0) += n as i64 * freq;
                self.where_to_update.entry(p).or_default().insert(idx);
            }
        }

        let mut changes = Vec::with_capacity(deltas.len());
        for (p, delta) in deltas {
            if delta == 0 {
                continue;
            }
            let current = self.pair_counts.get(&p).copied().unwrap_or(0);
            let new_count = (current as i64 + delta).max(0) as u64;
            if new_count > 0 {
                self.pair_counts.insert(p, new_count);
            } else {
                self.pair_counts.remove(&p);
            }
            changes.push((p, new_count));
        }

        changes
    }

    /// Get the number of unique words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Get the total count of all word occurrences.
    pub fn total_word_occurrences(&self) -> u64 {
        self.word_counts
            .iter()
            .fold(0u64, |acc, &count| acc.saturating_add(count))
    }

    /// Get a reference to the words.
    pub fn words(&self) -> &[Vec<u32>] {
        &self.words
    }

    /// Get a reference to the word counts.
    pub fn word_counts(&self) -> &[u64] {
        &self.word_counts
    }
}

/// Occurrences of each adjacent pair in one word.
fn pair_occurrences(word: &[u32]) -> AHashMap<Pair, u64> {
    let mut occurrences = AHashMap::with_capacity(word.len());
    for window in word.windows(2) {
        *occurrences.entry((window[0], window[1])).or_insert(0) += 1;
    }
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(words: &[(&[u32], u64)]) -> PairCounter {
        let mut counter = PairCounter::new();
        for &(symbols, count) in words {
            counter.add_word(symbols.to_vec(), count).unwrap();
        }
        counter.build_index(false);
        counter
    }

    #[test]
    fn test_count_pairs_with_frequency() {
        let counter = counter(&[(&[0, 1], 3), (&[1, 2], 1)]);
        assert_eq!(counter.count((0, 1)), 3);
        assert_eq!(counter.count((1, 2)), 1);
        assert_eq!(counter.count((2, 3)), 0);
    }

    #[test]
    fn test_count_pairs_parallel_matches_sequential() {
        let mut counter = PairCounter::new();
        counter.add_word(vec![0, 1, 2], 1).unwrap();
        counter.add_word(vec![1, 2, 3], 2).unwrap();
        counter.add_word(vec![2, 3, 4], 5).unwrap();

        let parallel = counter.count_pairs_parallel();
        assert_eq!(parallel, counter.count_pairs_sequential());
        assert_eq!(parallel.get(&(1, 2)), Some(&3));
        assert_eq!(parallel.get(&(2, 3)), Some(&7));
    }

    #[test]
    fn test_inverted_index() {
        let counter = counter(&[(&[0, 1, 2], 1), (&[1, 2], 1), (&[3], 1)]);
        let words = counter.words_containing((1, 2)).unwrap();
        assert_eq!(words.len(), 2);
        assert!(words.contains(&0) && words.contains(&1));
        assert!(counter.words_containing((2, 3)).is_none());
    }

    #[test]
    fn test_merge_updates_neighbours() {
        // a b c (x2), b c (x3)
        let mut counter = counter(&[(&[0, 1, 2], 2), (&[1, 2], 3)]);
        let changes = counter.merge_pair((1, 2), 9);

        assert_eq!(counter.words()[0], vec![0, 9]);
        assert_eq!(counter.words()[1], vec![9]);
        assert_eq!(counter.count((1, 2)), 0);
        assert_eq!(counter.count((0, 1)), 0);
        assert_eq!(counter.count((0, 9)), 2);

        let changes: AHashMap<_, _> = changes.into_iter().collect();
        assert_eq!(changes.get(&(1, 2)), Some(&0));
        assert_eq!(changes.get(&(0, 1)), Some(&0));
        assert_eq!(changes.get(&(0, 9)), Some(&2));

        assert!(counter.words_containing((1, 2)).is_none());
        assert!(counter.words_containing((0, 1)).is_none());
        assert!(counter.words_containing((0, 9)).unwrap().contains(&0));
    }

    #[test]
    fn test_merge_overlapping_run() {
        // a a a a: (a,a) occurs 3 times but merges twice
        let mut counter = counter(&[(&[0, 0, 0, 0], 1)]);
        assert_eq!(counter.count((0, 0)), 3);

        counter.merge_pair((0, 0), 7);
        assert_eq!(counter.words()[0], vec![7, 7]);
        assert_eq!(counter.count((0, 0)), 0);
        assert_eq!(counter.count((7, 7)), 1);
    }

    #[test]
    fn test_counts_match_full_recount_after_merges() {
        let mut counter = counter(&[
            (&[0, 1, 0, 1, 2], 4),
            (&[1, 0, 1], 2),
            (&[2, 0, 1, 1], 7),
        ]);

        counter.merge_pair((0, 1), 10);
        counter.merge_pair((10, 10), 11);
        counter.merge_pair((1, 10), 12);

        let recount = counter.count_pairs_sequential();
        assert_eq!(counter.pair_counts(), &recount);
    }

    #[test]
    fn test_oversized_frequencies_rejected() {
        let mut counter = PairCounter::new();
        counter.add_word(vec![0, 1], MAX_PAIR_MASS / 2).unwrap();
        assert!(matches!(
            counter.add_word(vec![1, 0, 1], MAX_PAIR_MASS / 2),
            Err(TokenizerError::Training(_))
        ));
        assert!(matches!(
            counter.add_word(vec![0], u64::MAX),
            Err(TokenizerError::Training(_))
        ));
        assert_eq!(counter.word_count(), 1);
    }

    #[test]
    fn test_large_frequencies_keep_exact_deltas() {
        // a b c with a frequency past u32::MAX; the merge must not wrap.
        let big = u32::MAX as u64 * 4;
        let mut counter = counter(&[(&[0, 1, 2], big), (&[1, 2], 1)]);
        let changes: AHashMap<_, _> = counter.merge_pair((0, 1), 9).into_iter().collect();

        assert_eq!(changes.get(&(0, 1)), Some(&0));
        assert_eq!(changes.get(&(1, 2)), Some(&1));
        assert_eq!(changes.get(&(9, 2)), Some(&big));
        assert_eq!(counter.pair_counts(), &counter.count_pairs_sequential());
    }

    #[test]
    fn test_from_word_table() {
        let mut vocab = Vocabulary::new();
        vocab.add_token("न").unwrap();
        vocab.add_token("म").unwrap();

        let mut table = WordTable::new();
        table.insert("नम".into(), 2);
        table.insert("मन".into(), 0);

        let counter = PairCounter::from_word_table(&table, &vocab).unwrap();
        assert_eq!(counter.word_count(), 1);
        assert_eq!(counter.words()[0], vec![0, 1]);
        assert_eq!(counter.total_word_occurrences(), 2);

        table.insert("क".into(), 1);
        assert!(matches!(
            PairCounter::from_word_table(&table, &vocab),
            Err(TokenizerError::UnknownSymbol(_))
        ));
    }
}
