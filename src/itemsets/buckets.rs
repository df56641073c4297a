use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bitvec::prelude::*;
use tracing::debug;

use crate::error::{BucketPhase, PcyError, Result};
use crate::itemsets::count::Threshold;
use crate::itemsets::pairs;
use crate::types::{BucketId, Item};

fn item_hash(item: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    item.hash(&mut hasher);
    hasher.finish()
}

/// Bucket that the pair `{a, b}` is counted in.
///
/// `bucket_of(a, b, n) == bucket_of(b, a, n)` and the result is always below `n`.
pub fn bucket_of(a: &str, b: &str, num_buckets: usize) -> BucketId {
    (item_hash(a).wrapping_add(item_hash(b)) % num_buckets as u64) as BucketId
}

/// Fixed-size pair counter. Its size never depends on how many distinct pairs
/// are seen, so colliding pairs share a counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCounts {
    counts: Vec<u32>,
}

impl BucketCounts {
    pub fn new(num_buckets: usize) -> Result<BucketCounts> {
        if num_buckets == 0 {
            return Err(PcyError::NoBuckets);
        }
        Ok(BucketCounts {
            counts: vec![0; num_buckets],
        })
    }

    pub fn num_buckets(&self) -> usize {
        self.counts.len()
    }

    /// Counters saturate at `u32::MAX`.
    pub fn increment(&mut self, a: &str, b: &str) -> BucketId {
        let bucket = bucket_of(a, b, self.counts.len());
        self.counts[bucket] = self.counts[bucket].saturating_add(1);
        bucket
    }

    pub fn get(&self, bucket: BucketId) -> Result<u32> {
        self.counts
            .get(bucket)
            .copied()
            .ok_or(PcyError::BucketOutOfRange {
                index: bucket,
                num_buckets: self.counts.len(),
            })
    }

    pub fn merge(mut self, other: BucketCounts) -> Result<BucketCounts> {
        if self.counts.len() != other.counts.len() {
            return Err(PcyError::BucketSizeMismatch {
                left: self.counts.len(),
                right: other.counts.len(),
            });
        }
        for (count, extra) in self.counts.iter_mut().zip(other.counts) {
            *count = count.saturating_add(extra);
        }
        Ok(self)
    }

    pub fn to_bitmap(&self, threshold: Threshold) -> FrequencyBitmap {
        FrequencyBitmap {
            bits: self
                .counts
                .iter()
                .map(|&count| threshold.is_met(count))
                .collect(),
        }
    }
}

/// One bit per bucket, set when the bucket's count met the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyBitmap {
    bits: BitVec,
}

impl FrequencyBitmap {
    pub fn num_buckets(&self) -> usize {
        self.bits.len()
    }

    pub fn query_bit(&self, bucket: BucketId) -> Result<bool> {
        self.bits
            .get(bucket)
            .map(|bit| *bit)
            .ok_or(PcyError::BucketOutOfRange {
                index: bucket,
                num_buckets: self.bits.len(),
            })
    }

    pub fn is_frequent(&self, a: &str, b: &str) -> bool {
        self.bits[bucket_of(a, b, self.bits.len())]
    }

    pub fn frequent_buckets(&self) -> usize {
        self.bits.count_ones()
    }
}

#[derive(Debug, Clone)]
enum State {
    Counting(BucketCounts),
    Compacted(FrequencyBitmap),
}

/// Pair bucket table that starts out counting and is compacted exactly once
/// into a [`FrequencyBitmap`].
///
/// Counting operations are rejected once compacted, and bit queries are
/// rejected while still counting. The counters are dropped on compaction.
#[derive(Debug, Clone)]
pub struct PairBuckets {
    state: State,
}

impl PairBuckets {
    pub fn new(num_buckets: usize) -> Result<PairBuckets> {
        Ok(PairBuckets {
            state: State::Counting(BucketCounts::new(num_buckets)?),
        })
    }

    pub fn phase(&self) -> BucketPhase {
        match self.state {
            State::Counting(_) => BucketPhase::Counting,
            State::Compacted(_) => BucketPhase::Compacted,
        }
    }

    pub fn num_buckets(&self) -> usize {
        match &self.state {
            State::Counting(counts) => counts.num_buckets(),
            State::Compacted(bitmap) => bitmap.num_buckets(),
        }
    }

    fn counts_mut(&mut self, operation: &'static str) -> Result<&mut BucketCounts> {
        match &mut self.state {
            State::Counting(counts) => Ok(counts),
            State::Compacted(_) => Err(PcyError::InvalidState {
                operation,
                phase: BucketPhase::Compacted,
            }),
        }
    }

    fn counts(&self, operation: &'static str) -> Result<&BucketCounts> {
        match &self.state {
            State::Counting(counts) => Ok(counts),
            State::Compacted(_) => Err(PcyError::InvalidState {
                operation,
                phase: BucketPhase::Compacted,
            }),
        }
    }

    pub fn increment(&mut self, a: &str, b: &str) -> Result<BucketId> {
        Ok(self.counts_mut("increment a bucket")?.increment(a, b))
    }

    /// Counts every pair of distinct items in `basket`.
    pub fn absorb(&mut self, basket: &[Item]) -> Result<()> {
        let counts = self.counts_mut("increment a bucket")?;
        for (a, b) in pairs(basket) {
            counts.increment(a, b);
        }
        Ok(())
    }

    pub fn count(&self, bucket: BucketId) -> Result<u32> {
        self.counts("read a bucket count")?.get(bucket)
    }

    /// Adds the counters of another table of the same size.
    pub fn merge(self, other: PairBuckets) -> Result<PairBuckets> {
        match (self.state, other.state) {
            (State::Counting(left), State::Counting(right)) => Ok(PairBuckets {
                state: State::Counting(left.merge(right)?),
            }),
            _ => Err(PcyError::InvalidState {
                operation: "merge bucket tables",
                phase: BucketPhase::Compacted,
            }),
        }
    }

    /// Turns the counters into a bitmap and releases them.
    pub fn compact(&mut self, threshold: Threshold) -> Result<()> {
        let bitmap = self.counts("compact")?.to_bitmap(threshold);
        debug!(
            buckets = bitmap.num_buckets(),
            frequent = bitmap.frequent_buckets(),
            "Compacted bucket counts into a bitmap"
        );
        self.state = State::Compacted(bitmap);
        Ok(())
    }

    pub fn bitmap(&self) -> Result<&FrequencyBitmap> {
        match &self.state {
            State::Compacted(bitmap) => Ok(bitmap),
            State::Counting(_) => Err(PcyError::InvalidState {
                operation: "query a frequency bit",
                phase: BucketPhase::Counting,
            }),
        }
    }

    pub fn query_bit(&self, bucket: BucketId) -> Result<bool> {
        self.bitmap()?.query_bit(bucket)
    }

    pub fn is_frequent_pair(&self, a: &str, b: &str) -> Result<bool> {
        Ok(self.bitmap()?.is_frequent(a, b))
    }
}
