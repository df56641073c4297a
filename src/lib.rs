//! Frequent item pairs from a basket log with the PCY algorithm.
//!
//! The first pass counts single items and hashes every pair into a fixed
//! number of buckets. Between passes the buckets collapse into a bitmap. The
//! second pass counts only pairs whose items are both frequent and whose
//! bucket bit is set, and a final check keeps the pairs that really meet the
//! support threshold.

#[cfg(test)]
macro_rules! str_vec {
    ($($x:expr),*) => {
        {
            let mut vec: Vec<String> = vec![];
            $(vec.push($x.into());)*
            vec
        }
    };
}

pub mod basket;
pub mod config;
pub mod error;
pub mod itemsets;
pub mod types;
#[cfg(feature = "python")]
mod wrapper;

pub use basket::{parse_basket, BasketSource, Baskets};
pub use config::{sample_size, BucketPolicy, Fraction, MinerConfig};
pub use error::{BucketPhase, PcyError, Result};
pub use itemsets::count::Threshold;
pub use itemsets::pcy::{pcy, pcy_file, pcy_parallel, PcyOutcome};
pub use types::{Basket, FrequentPairs, Item, PairKey};
