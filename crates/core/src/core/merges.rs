//! Merge rule management for BPE.
//!
//! This module provides data structures for storing and accessing BPE merge rules.
//! Merge rules are stored using token IDs rather than strings for fast comparison.
//! The rank of a rule is its position in learning order.

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;

/// A pair of token IDs that can be merged.
pub type Pair = (u32, u32);

/// Merge rule mapping: pair -> (rank, new_token_id).
///
/// The rank indicates the priority of this merge rule (lower rank = higher priority).
/// The new_token_id is the ID of the token created by merging this pair.
pub type MergeMap = AHashMap<Pair, (u32, u32)>;

/// Ordered collection of BPE merge rules with constant-time pair lookup.
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    /// Merge rules: pair -> (rank, new_token_id)
    merges: MergeMap,
    /// Rules in rank order: (pair, new_token_id)
    ordered: Vec<(Pair, u32)>,
}

impl MergeRules {
    /// Create a new empty collection of merge rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new collection with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            merges: MergeMap::with_capacity(capacity),
            ordered: Vec::with_capacity(capacity),
        }
    }

    /// Append a merge rule with the next rank.
    ///
    /// Returns the rank assigned to the rule.
    pub fn push(&mut self, pair: Pair, new_token_id: u32) -> Result<u32> {
        if self.merges.contains_key(&pair) {
            return Err(TokenizerError::InvalidMerge(format!(
                "pair ({}, {}) already has a rule",
                pair.0, pair.1
            )));
        }

        let rank = self.ordered.len() as u32;
        self.merges.insert(pair, (rank, new_token_id));
        self.ordered.push((pair, new_token_id));

        Ok(rank)
    }

    /// Get the merge rule for a pair.
    ///
    /// Returns Some((rank, new_token_id)) if this pair should be merged,
    /// None otherwise.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<(u32, u32)> {
        self.merges.get(&pair).copied()
    }

    /// Iterate rules in rank order as `(rank, pair, new_token_id)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Pair, u32)> + '_ {
        self.ordered
            .iter()
            .enumerate()
            .map(|(rank, &(pair, new_id))| (rank as u32, pair, new_id))
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_ranks_in_order() {
        let mut rules = MergeRules::new();
        assert_eq!(rules.push((0, 1), 100).unwrap(), 0);
        assert_eq!(rules.push((1, 2), 101).unwrap(), 1);

        assert_eq!(rules.get((0, 1)), Some((0, 100)));
        assert_eq!(rules.get((1, 2)), Some((1, 101)));
        assert_eq!(rules.get((2, 3)), None);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let mut rules = MergeRules::new();
        rules.push((0, 1), 100).unwrap();
        assert!(matches!(
            rules.push((0, 1), 101),
            Err(TokenizerError::InvalidMerge(_))
        ));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_iter_in_rank_order() {
        let mut rules = MergeRules::new();
        rules.push((5, 6), 10).unwrap();
        rules.push((0, 1), 11).unwrap();
        rules.push((10, 11), 12).unwrap();

        let collected: Vec<_> = rules.iter().collect();
        assert_eq!(
            collected,
            vec![(0, (5, 6), 10), (1, (0, 1), 11), (2, (10, 11), 12)]
        );
    }

    #[test]
    fn test_empty() {
        let rules = MergeRules::new();
        assert!(rules.is_empty());
        assert_eq!(rules.iter().next(), None);
    }
}
