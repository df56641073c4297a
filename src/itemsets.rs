use itertools::Itertools;

use crate::types::Item;

pub mod buckets;
pub mod candidates;
pub mod count;
pub mod pcy;
pub mod verify;

/// Every unordered pair of distinct items in a basket, by position.
///
/// A token repeated within a basket pairs with each other item once per
/// occurrence. Both passes enumerate pairs through here so their views agree.
pub fn pairs(basket: &[Item]) -> impl Iterator<Item = (&str, &str)> + '_ {
    basket
        .iter()
        .tuple_combinations()
        .filter(|(a, b)| a != b)
        .map(|(a, b)| (a.as_str(), b.as_str()))
}
