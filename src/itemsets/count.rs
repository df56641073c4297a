use std::collections::HashMap;

use tracing::debug;

use crate::config::Fraction;
use crate::types::{FrequentItems, Item, ItemCounts};

const APPROX_NUM_UNIQUE_ITEMS: usize = 1024; // arbitrary

/// Minimum number of baskets an item or pair must appear in.
///
/// Comparison is inclusive everywhere: a count exactly equal to the quota is
/// frequent. The quota is the smallest whole count at or above
/// `support * num_baskets`, with float noise in the product absorbed so that
/// e.g. `0.07 * 100` gives a quota of 7, not 8.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold {
    value: f64,
    quota: u64,
}

impl Threshold {
    pub fn from_support(support: Fraction, num_baskets: usize) -> Threshold {
        let value = support.value() * num_baskets as f64;
        let tolerance = 1e-9 * num_baskets.max(1) as f64;
        // negative results saturate to 0 on the cast
        let quota = (value - tolerance).ceil() as u64;
        Threshold { value, quota }
    }

    pub fn value(self) -> f64 {
        self.value
    }

    pub fn quota(self) -> u64 {
        self.quota
    }

    pub fn is_met(self, count: u32) -> bool {
        u64::from(count) >= self.quota
    }
}

/// Singleton counts gathered during the first pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFrequencyCounter {
    counts: ItemCounts,
}

impl ItemFrequencyCounter {
    pub fn new() -> Self {
        ItemFrequencyCounter {
            counts: HashMap::with_capacity(APPROX_NUM_UNIQUE_ITEMS),
        }
    }

    /// Counts every occurrence, repeated tokens included.
    pub fn observe(&mut self, basket: &[Item]) {
        for item in basket {
            match self.counts.get_mut(item) {
                Some(count) => *count = count.saturating_add(1),
                None => {
                    self.counts.insert(item.to_owned(), 1);
                }
            }
        }
    }

    /// Unseen items count as zero.
    pub fn count(&self, item: &str) -> u32 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    pub fn distinct_items(&self) -> usize {
        self.counts.len()
    }

    /// Adds another partial table into this one.
    pub fn merge(mut self, other: ItemFrequencyCounter) -> Self {
        let (mut into, from) = if self.counts.len() >= other.counts.len() {
            (std::mem::take(&mut self.counts), other.counts)
        } else {
            (other.counts, std::mem::take(&mut self.counts))
        };
        for (item, count) in from {
            let total = into.entry(item).or_insert(0);
            *total = total.saturating_add(count);
        }
        ItemFrequencyCounter { counts: into }
    }

    pub fn frequent_items(&self, threshold: Threshold) -> FrequentItems {
        let frequent: FrequentItems = self
            .counts
            .iter()
            .filter(|&(_, &count)| threshold.is_met(count))
            .map(|(item, _)| item.to_owned())
            .collect();
        debug!(
            distinct = self.counts.len(),
            frequent = frequent.len(),
            threshold = threshold.value(),
            "Derived frequent items"
        );
        frequent
    }

    pub fn counts(&self) -> &ItemCounts {
        &self.counts
    }

    pub fn into_counts(self) -> ItemCounts {
        self.counts
    }
}

impl From<ItemCounts> for ItemFrequencyCounter {
    fn from(counts: ItemCounts) -> Self {
        ItemFrequencyCounter { counts }
    }
}
