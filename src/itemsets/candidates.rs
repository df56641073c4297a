use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::itemsets::buckets::{FrequencyBitmap, PairBuckets};
use crate::itemsets::pairs;
use crate::types::{Basket, CandidatePairs, FrequentItems, Item, PairKey};

/// Second pass: exact counts for pairs that survive both first-pass filters.
///
/// A pair is counted only when both of its items are frequent and its bucket
/// bit is set. Bucket frequency is necessary but not sufficient, so the table
/// still holds false positives for [`verify`](crate::itemsets::verify) to drop.
pub struct CandidatePairScanner<'a> {
    frequent_items: &'a FrequentItems,
    bitmap: &'a FrequencyBitmap,
}

impl<'a> CandidatePairScanner<'a> {
    /// Fails if `buckets` has not been compacted yet.
    pub fn new(
        frequent_items: &'a FrequentItems,
        buckets: &'a PairBuckets,
    ) -> Result<CandidatePairScanner<'a>> {
        Ok(CandidatePairScanner {
            frequent_items,
            bitmap: buckets.bitmap()?,
        })
    }

    pub fn is_candidate(&self, a: &str, b: &str) -> bool {
        self.frequent_items.contains(a)
            && self.frequent_items.contains(b)
            && self.bitmap.is_frequent(a, b)
    }

    pub fn observe(&self, candidates: &mut CandidatePairs, basket: &[Item]) {
        for (a, b) in pairs(basket) {
            if !self.is_candidate(a, b) {
                continue;
            }
            if let Some(key) = PairKey::new(a, b) {
                let count = candidates.entry(key).or_insert(0);
                *count = count.saturating_add(1);
            }
        }
    }

    pub fn scan<I>(&self, baskets: I) -> Result<CandidatePairs>
    where
        I: IntoIterator<Item = Result<Basket>>,
    {
        let mut candidates = HashMap::new();
        let mut num_baskets = 0_usize;
        for basket in baskets {
            self.observe(&mut candidates, &basket?);
            num_baskets += 1;
        }
        debug!(
            baskets = num_baskets,
            candidates = candidates.len(),
            "Counted candidate pairs"
        );
        Ok(candidates)
    }
}

/// Adds two partial candidate tables.
pub fn merge_candidates(mut left: CandidatePairs, right: CandidatePairs) -> CandidatePairs {
    if left.len() < right.len() {
        return merge_candidates(right, left);
    }
    for (pair, count) in right {
        let total = left.entry(pair).or_insert(0);
        *total = total.saturating_add(count);
    }
    left
}
