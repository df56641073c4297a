use tracing::{debug, trace};

use crate::itemsets::count::Threshold;
use crate::types::{CandidatePairs, FrequentPairs};

/// Keeps exactly the candidates whose count meets `threshold`.
pub fn verify(candidates: CandidatePairs, threshold: Threshold) -> FrequentPairs {
    let before = candidates.len();
    let (frequent, dropped): (FrequentPairs, CandidatePairs) = candidates
        .into_iter()
        .partition(|&(_, count)| threshold.is_met(count));

    for (pair, count) in &dropped {
        trace!(%pair, count, "Dropping infrequent candidate");
    }
    debug!(
        before,
        after = frequent.len(),
        threshold = threshold.value(),
        "Verified candidate pairs"
    );

    frequent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Fraction;
    use crate::types::PairKey;
    use maplit::hashmap;

    fn pair(a: &str, b: &str) -> PairKey {
        PairKey::new(a, b).unwrap()
    }

    fn threshold(support: f64, num_baskets: usize) -> Threshold {
        Threshold::from_support(Fraction::new("support", support).unwrap(), num_baskets)
    }

    #[test]
    fn keeps_count_equal_to_threshold() {
        let candidates = hashmap! {
            pair("1", "2") => 2,
            pair("1", "3") => 1,
            pair("2", "3") => 5,
        };

        assert_eq!(
            verify(candidates, threshold(0.5, 4)),
            hashmap! { pair("1", "2") => 2, pair("2", "3") => 5 }
        );
    }

    #[test]
    fn drops_everything_below_threshold() {
        let candidates = hashmap! { pair("a", "b") => 2 };
        assert!(verify(candidates, threshold(0.75, 4)).is_empty());
    }

    #[test]
    fn empty_candidates() {
        assert!(verify(CandidatePairs::new(), threshold(0.5, 4)).is_empty());
    }
}
