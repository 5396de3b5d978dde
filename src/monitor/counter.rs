//! Keyed occurrence counting with top-K extraction.

use std::collections::HashMap;

/// One entry of a [`Counter::top`] ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEntry {
    pub key: String,
    pub count: u64,
}

/// Tallies opaque string keys (source addresses, users, sections).
#[derive(Debug, Default)]
pub struct Counter {
    counts: HashMap<String, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: &str) {
        // Only allocate the owned key on first sight.
        match self.counts.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(key.to_string(), 1);
            }
        }
    }

    /// Returns the `n` most frequent keys, most frequent first.
    ///
    /// Ties are broken by key ordering so repeated calls over the same counts
    /// return the same ranking. Pure projection: internal counts are not
    /// touched, and fewer than `n` entries come back when fewer distinct keys
    /// exist. There is room for optimisation here using a max-heap.
    pub fn top(&self, n: usize) -> Vec<CounterEntry> {
        if n == 0 {
            return Vec::new();
        }

        let mut entries: Vec<CounterEntry> = self
            .counts
            .iter()
            .map(|(key, &count)| CounterEntry { key: key.clone(), count })
            .collect();

        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        entries.truncate(n);
        entries
    }
}
