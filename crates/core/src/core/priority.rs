//! Priority queue for BPE merge candidates.
//!
//! This module provides the max-count selection used by the merge learner.
//! Ordering is total: higher count first, then the lexicographically smallest
//! `(left, right)` symbol strings, so training never depends on hash order.

use crate::core::merges::Pair;
use ahash::AHashMap;
use compact_str::CompactString;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;

/// A merge candidate during BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of token IDs to merge
    pub pair: Pair,
    /// The (frequency-weighted) count of this pair
    pub count: u64,
    /// Symbol string of the left token
    pub left: CompactString,
    /// Symbol string of the right token
    pub right: CompactString,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(
        pair: Pair,
        count: u64,
        left: impl Into<CompactString>,
        right: impl Into<CompactString>,
    ) -> Self {
        Self {
            pair,
            count,
            left: left.into(),
            right: right.into(),
        }
    }

    /// The symbol produced by merging this pair.
    pub fn merged(&self) -> CompactString {
        let mut merged = CompactString::with_capacity(self.left.len() + self.right.len());
        merged.push_str(&self.left);
        merged.push_str(&self.right);
        merged
    }
}

// Max-heap order: higher count wins, ties go to the smaller symbol strings.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| {
                (other.left.as_str(), other.right.as_str())
                    .cmp(&(self.left.as_str(), self.right.as_str()))
            })
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge operations.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
/// Entries are invalidated lazily: pushing a new count for a pair makes
/// every older entry for that pair stale.
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Track current counts to detect stale entries
    current_counts: AHashMap<Pair, u64>,
}

impl PairPriorityQueue {
    /// Create a new priority queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current_counts: AHashMap::with_capacity(capacity),
        }
    }

    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
            current_counts: AHashMap::new(),
        }
    }

    /// Push a merge candidate, superseding any earlier entry for its pair.
    ///
    /// A zero count removes the pair instead.
    pub fn push(&mut self, candidate: MergeCandidate) {
        if candidate.count == 0 {
            self.remove(candidate.pair);
            return;
        }
        self.current_counts.insert(candidate.pair, candidate.count);
        self.heap.push(candidate);
    }

    /// Invalidate every entry for a pair.
    pub fn remove(&mut self, pair: Pair) {
        self.current_counts.remove(&pair);
    }

    /// Pop the highest priority merge candidate.
    ///
    /// Returns None if the queue is empty or only contains stale entries.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if let Some(&current) = self.current_counts.get(&candidate.pair) {
                if current == candidate.count {
                    self.current_counts.remove(&candidate.pair);
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Get the number of (potentially stale) entries in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.current_counts.is_empty()
    }
}

impl Default for PairPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(pair: Pair, count: u64, left: &str, right: &str) -> MergeCandidate {
        MergeCandidate::new(pair, count, left, right)
    }

    #[test]
    fn test_push_pop() {
        let mut queue = PairPriorityQueue::new();

        queue.push(cand((0, 1), 10, "a", "b"));
        queue.push(cand((1, 2), 20, "b", "c"));
        queue.push(cand((2, 3), 15, "c", "d"));

        let first = queue.pop().unwrap();
        assert_eq!(first.pair, (1, 2));
        assert_eq!(first.count, 20);

        let second = queue.pop().unwrap();
        assert_eq!(second.pair, (2, 3));

        let third = queue.pop().unwrap();
        assert_eq!(third.pair, (0, 1));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_ties_prefer_smaller_strings() {
        let mut queue = PairPriorityQueue::new();

        // Ids are deliberately in the opposite order of the strings.
        queue.push(cand((9, 9), 5, "न", "म"));
        queue.push(cand((1, 1), 5, "स", "्"));
        queue.push(cand((5, 5), 5, "त", "े"));
        queue.push(cand((2, 7), 5, "न", "ि"));

        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|c| c.merged().to_string())
            .collect();
        assert_eq!(order, vec!["ते", "नम", "नि", "स्"]);
    }

    #[test]
    fn test_stale_entry_detection() {
        let mut queue = PairPriorityQueue::new();

        queue.push(cand((0, 1), 10, "a", "b"));
        queue.push(cand((1, 2), 20, "b", "c"));

        // New count for (0, 1) makes the first entry stale
        queue.push(cand((0, 1), 15, "a", "b"));

        let first = queue.pop().unwrap();
        assert_eq!(first.pair, (1, 2));

        let second = queue.pop().unwrap();
        assert_eq!(second.pair, (0, 1));
        assert_eq!(second.count, 15);

        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_zero_count_removes() {
        let mut queue = PairPriorityQueue::new();

        queue.push(cand((0, 1), 10, "a", "b"));
        queue.push(cand((0, 1), 0, "a", "b"));

        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }
}
