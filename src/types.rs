use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter, Result};

pub type Item = String;
pub type Basket = Vec<Item>;

pub type ItemCounts = HashMap<Item, u32>;
pub type FrequentItems = HashSet<Item>;

pub type BucketId = usize;

pub type CandidatePairs = HashMap<PairKey, u32>;
pub type FrequentPairs = HashMap<PairKey, u32>;

/// An unordered pair of two distinct items.
///
/// The two items are stored in a canonical order so that `(a, b)` and `(b, a)`
/// compare and hash identically. Identity comes from the items themselves,
/// never from where they sat inside a basket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: Item,
    second: Item,
}

impl PairKey {
    /// Returns `None` when both items are the same token.
    pub fn new(a: &str, b: &str) -> Option<PairKey> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(PairKey {
                first: a.to_owned(),
                second: b.to_owned(),
            }),
            std::cmp::Ordering::Greater => Some(PairKey {
                first: b.to_owned(),
                second: a.to_owned(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, item: &str) -> bool {
        self.first == item || self.second == item
    }

    pub fn into_tuple(self) -> (Item, Item) {
        (self.first, self.second)
    }
}

impl Display for PairKey {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}
