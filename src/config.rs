use crate::basket::DEFAULT_DELIMITER;
use crate::error::{PcyError, Result};

/// A proportion in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fraction(f64);

impl Fraction {
    pub const ONE: Fraction = Fraction(1.0);

    pub fn new(name: &'static str, value: f64) -> Result<Fraction> {
        if (0.0..=1.0).contains(&value) {
            Ok(Fraction(value))
        } else {
            Err(PcyError::FractionOutOfRange { name, value })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Number of baskets to read when sampling `fraction` of a log holding
/// `total_records` records.
pub fn sample_size(total_records: usize, fraction: Fraction) -> usize {
    (total_records as f64 * fraction.value()).floor() as usize
}

/// How many hash buckets the first pass counts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketPolicy {
    /// One bucket for every two baskets sampled.
    #[default]
    HalfBaskets,
    Fixed(usize),
}

impl BucketPolicy {
    /// Never returns zero.
    pub fn num_buckets(self, num_baskets: usize) -> usize {
        let n = match self {
            BucketPolicy::HalfBaskets => num_baskets / 2,
            BucketPolicy::Fixed(n) => n,
        };
        n.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct MinerConfig {
    pub support: Fraction,
    pub buckets: BucketPolicy,
    pub delimiter: char,
}

impl MinerConfig {
    pub fn new(support: Fraction) -> Self {
        MinerConfig {
            support,
            buckets: BucketPolicy::default(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_buckets(mut self, buckets: BucketPolicy) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}
