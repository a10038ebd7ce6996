//! Insertion-ordered tally
//!
//! Ranking sorts by descending count with a stable sort, so equal counts
//! keep the order in which their keys were first seen.

use std::hash::Hash;

use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct OrderedCounter<K> {
    counts: IndexMap<K, u64>,
}

impl<K: Hash + Eq> Default for OrderedCounter<K> {
    fn default() -> Self {
        Self {
            counts: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq> OrderedCounter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, key: K) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: K, n: u64) {
        let count = self.counts.entry(key).or_insert(0);
        *count = count.saturating_add(n);
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries in first-seen order
    pub fn into_entries(self) -> Vec<(K, u64)> {
        self.counts.into_iter().collect()
    }

    /// Entries sorted by descending count, ties in first-seen order
    pub fn into_ranked(self) -> Vec<(K, u64)> {
        let mut entries = self.into_entries();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl<K: Hash + Eq> FromIterator<K> for OrderedCounter<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = Self::new();
        for key in iter {
            counter.incr(key);
        }
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_first_seen_order() {
        let counter: OrderedCounter<&str> = ["b", "a", "b", "c"].into_iter().collect();
        assert_eq!(counter.len(), 3);
        assert_eq!(counter.get(&"b"), 2);
        assert_eq!(counter.get(&"missing"), 0);
        assert_eq!(
            counter.into_entries(),
            vec![("b", 2), ("a", 1), ("c", 1)]
        );
    }

    #[test]
    fn test_ranked_ties_keep_first_seen_order() {
        let counter: OrderedCounter<&str> =
            ["x", "y", "z", "y", "z", "w"].into_iter().collect();
        assert_eq!(
            counter.into_ranked(),
            vec![("y", 2), ("z", 2), ("x", 1), ("w", 1)]
        );
    }

    #[test]
    fn test_add_saturates() {
        let mut counter = OrderedCounter::new();
        counter.add("k", u64::MAX);
        counter.add("k", 5);
        assert_eq!(counter.get(&"k"), u64::MAX);
    }

    #[test]
    fn test_empty() {
        let counter = OrderedCounter::<String>::new();
        assert!(counter.is_empty());
        assert!(counter.into_ranked().is_empty());
    }
}
