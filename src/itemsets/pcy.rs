use std::collections::HashMap;

use rayon::prelude::*;
use tracing::info;

use crate::basket::BasketSource;
use crate::config::MinerConfig;
use crate::error::{PcyError, Result};
use crate::itemsets::buckets::PairBuckets;
use crate::itemsets::candidates::{merge_candidates, CandidatePairScanner};
use crate::itemsets::count::{ItemFrequencyCounter, Threshold};
use crate::itemsets::verify::verify;
use crate::types::{Basket, CandidatePairs, FrequentItems, FrequentPairs, Item};

/// Everything gathered in the first scan: singleton counts and pair buckets.
#[derive(Debug, Clone)]
pub struct FirstPass {
    items: ItemFrequencyCounter,
    buckets: PairBuckets,
    baskets_read: usize,
}

impl FirstPass {
    pub fn new(num_buckets: usize) -> Result<FirstPass> {
        Ok(FirstPass {
            items: ItemFrequencyCounter::new(),
            buckets: PairBuckets::new(num_buckets)?,
            baskets_read: 0,
        })
    }

    pub fn observe(&mut self, basket: &[Item]) -> Result<()> {
        self.items.observe(basket);
        self.buckets.absorb(basket)?;
        self.baskets_read += 1;
        Ok(())
    }

    /// Combines the partial results of two disjoint basket partitions.
    pub fn merge(self, other: FirstPass) -> Result<FirstPass> {
        Ok(FirstPass {
            items: self.items.merge(other.items),
            buckets: self.buckets.merge(other.buckets)?,
            baskets_read: self.baskets_read + other.baskets_read,
        })
    }

    pub fn items(&self) -> &ItemFrequencyCounter {
        &self.items
    }

    pub fn buckets(&self) -> &PairBuckets {
        &self.buckets
    }

    pub fn baskets_read(&self) -> usize {
        self.baskets_read
    }
}

pub fn first_pass<I>(baskets: I, num_buckets: usize) -> Result<FirstPass>
where
    I: IntoIterator<Item = Result<Basket>>,
{
    let mut pass = FirstPass::new(num_buckets)?;
    for basket in baskets {
        pass.observe(&basket?)?;
    }
    Ok(pass)
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct PcyOutcome {
    pub baskets_read: usize,
    pub threshold: Threshold,
    pub distinct_items: usize,
    pub frequent_items: FrequentItems,
    pub num_buckets: usize,
    pub frequent_buckets: usize,
    /// Candidates counted in the second pass, before verification.
    pub candidate_pairs: usize,
    pub frequent_pairs: FrequentPairs,
}

fn run<P1, P2>(
    num_baskets: usize,
    config: &MinerConfig,
    pass_one: P1,
    pass_two: P2,
) -> Result<PcyOutcome>
where
    P1: FnOnce(usize) -> Result<FirstPass>,
    P2: FnOnce(&CandidatePairScanner<'_>) -> Result<CandidatePairs>,
{
    let num_buckets = config.buckets.num_buckets(num_baskets);
    info!(num_baskets, num_buckets, "Starting pass 1");

    let FirstPass {
        items,
        mut buckets,
        baskets_read,
    } = pass_one(num_buckets)?;
    let threshold = Threshold::from_support(config.support, baskets_read);
    let distinct_items = items.distinct_items();
    info!(
        baskets_read,
        distinct_items,
        threshold = threshold.value(),
        quota = threshold.quota(),
        "Pass 1 complete"
    );

    buckets.compact(threshold)?;
    let frequent_items = items.frequent_items(threshold);
    drop(items);
    let frequent_buckets = buckets.bitmap()?.frequent_buckets();
    info!(
        frequent_items = frequent_items.len(),
        frequent_buckets, "Starting pass 2"
    );

    let scanner = CandidatePairScanner::new(&frequent_items, &buckets)?;
    let candidates = pass_two(&scanner)?;
    let candidate_pairs = candidates.len();
    let frequent_pairs = verify(candidates, threshold);
    info!(
        candidate_pairs,
        frequent_pairs = frequent_pairs.len(),
        "Pass 2 complete"
    );

    Ok(PcyOutcome {
        baskets_read,
        threshold,
        distinct_items,
        frequent_items,
        num_buckets,
        frequent_buckets,
        candidate_pairs,
        frequent_pairs,
    })
}

/// Mines frequent pairs from the first `num_baskets` records of a log,
/// reading it once per pass.
pub fn pcy_file(
    source: &BasketSource,
    num_baskets: usize,
    config: &MinerConfig,
) -> Result<PcyOutcome> {
    run(
        num_baskets,
        config,
        |num_buckets| first_pass(source.baskets(num_baskets)?, num_buckets),
        |scanner| scanner.scan(source.baskets(num_baskets)?),
    )
}

/// Mines frequent pairs from baskets already in memory, one basket at a time.
pub fn pcy(baskets: &[Basket], config: &MinerConfig) -> Result<PcyOutcome> {
    run(
        baskets.len(),
        config,
        |num_buckets| {
            let mut pass = FirstPass::new(num_buckets)?;
            for basket in baskets {
                pass.observe(basket)?;
            }
            Ok(pass)
        },
        |scanner| {
            let mut candidates = HashMap::new();
            for basket in baskets {
                scanner.observe(&mut candidates, basket);
            }
            Ok(candidates)
        },
    )
}

/// Same result as [`pcy`], with each pass split into partitions whose
/// partial counts are summed.
pub fn pcy_parallel(baskets: &[Basket], config: &MinerConfig) -> Result<PcyOutcome> {
    run(
        baskets.len(),
        config,
        |num_buckets| {
            let empty = FirstPass::new(num_buckets)?;
            baskets
                .par_iter()
                .try_fold(
                    || empty.clone(),
                    |mut pass, basket| {
                        pass.observe(basket)?;
                        Ok::<_, PcyError>(pass)
                    },
                )
                .try_reduce(|| empty.clone(), FirstPass::merge)
        },
        |scanner| {
            Ok(baskets
                .par_iter()
                .fold(HashMap::new, |mut candidates, basket| {
                    scanner.observe(&mut candidates, basket);
                    candidates
                })
                .reduce(HashMap::new, merge_candidates))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BucketPolicy, Fraction};
    use crate::itemsets::pairs;
    use crate::types::PairKey;
    use maplit::{hashmap, hashset};
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn pair(a: &str, b: &str) -> PairKey {
        PairKey::new(a, b).unwrap()
    }

    fn config(support: f64) -> MinerConfig {
        MinerConfig::new(Fraction::new("support", support).unwrap())
    }

    fn exact_pair_counts(baskets: &[Basket]) -> HashMap<PairKey, u32> {
        let mut counts = HashMap::new();
        for basket in baskets {
            for (a, b) in pairs(basket) {
                *counts.entry(pair(a, b)).or_insert(0) += 1;
            }
        }
        counts
    }

    fn four_baskets() -> Vec<Basket> {
        vec![
            str_vec!["1", "2", "3"],
            str_vec!["1", "2"],
            str_vec!["2", "3"],
            str_vec!["1", "3"],
        ]
    }

    #[test]
    fn three_items_all_pairs_frequent() {
        let outcome = pcy(&four_baskets(), &config(0.5)).unwrap();

        assert_eq!(outcome.baskets_read, 4);
        assert_eq!(outcome.threshold.value(), 2.0);
        assert_eq!(outcome.distinct_items, 3);
        assert_eq!(
            outcome.frequent_items,
            hashset! { "1".to_owned(), "2".to_owned(), "3".to_owned() }
        );
        assert_eq!(
            outcome.frequent_pairs,
            hashmap! {
                pair("1", "2") => 2,
                pair("2", "3") => 2,
                pair("1", "3") => 2,
            }
        );
    }

    #[test]
    fn count_at_threshold_kept_and_one_below_dropped() {
        let baskets = vec![
            str_vec!["a", "b", "c"],
            str_vec!["a", "b"],
            str_vec!["a"],
            str_vec!["c"],
        ];
        let config = config(0.5).with_buckets(BucketPolicy::Fixed(1));
        let outcome = pcy(&baskets, &config).unwrap();

        // a single bucket lets every pair through to verification
        assert_eq!(outcome.candidate_pairs, 3);
        assert_eq!(outcome.frequent_pairs, hashmap! { pair("a", "b") => 2 });
    }

    #[test]
    fn decimal_support_keeps_pair_at_quota() {
        // 0.07 * 100 is slightly above 7 in floating point
        let mut baskets = vec![str_vec!["a", "b"]; 7];
        baskets.extend(vec![str_vec!["c"]; 93]);
        let outcome = pcy(&baskets, &config(0.07)).unwrap();

        assert_eq!(outcome.threshold.quota(), 7);
        assert_eq!(
            outcome.frequent_items,
            hashset! { "a".to_owned(), "b".to_owned(), "c".to_owned() }
        );
        assert_eq!(outcome.frequent_pairs, hashmap! { pair("a", "b") => 7 });

        let parallel = pcy_parallel(&baskets, &config(0.07)).unwrap();
        assert_eq!(parallel.frequent_pairs, outcome.frequent_pairs);
    }

    #[test]
    fn infrequent_items_never_pair() {
        let baskets = vec![
            str_vec!["milk", "bread"],
            str_vec!["milk", "bread", "caviar"],
            str_vec!["milk", "bread"],
        ];
        let outcome = pcy(&baskets, &config(0.6)).unwrap();

        assert!(!outcome.frequent_items.contains("caviar"));
        assert_eq!(outcome.candidate_pairs, 1);
        assert_eq!(outcome.frequent_pairs, hashmap! { pair("bread", "milk") => 3 });
    }

    #[test]
    fn empty_input() {
        let outcome = pcy(&[], &config(0.5)).unwrap();
        assert_eq!(outcome.baskets_read, 0);
        assert_eq!(outcome.num_buckets, 1);
        assert!(outcome.frequent_pairs.is_empty());
    }

    #[test]
    fn parallel_matches_sequential() {
        let baskets = four_baskets();
        let config = config(0.5).with_buckets(BucketPolicy::Fixed(3));
        let sequential = pcy(&baskets, &config).unwrap();
        let parallel = pcy_parallel(&baskets, &config).unwrap();

        assert_eq!(sequential.frequent_pairs, parallel.frequent_pairs);
        assert_eq!(sequential.frequent_items, parallel.frequent_items);
        assert_eq!(sequential.frequent_buckets, parallel.frequent_buckets);
        assert_eq!(sequential.candidate_pairs, parallel.candidate_pairs);
    }

    #[test]
    fn first_pass_merge_matches_single_scan() {
        let baskets = four_baskets();
        let whole = first_pass(baskets.iter().cloned().map(Ok), 4).unwrap();
        let left = first_pass(baskets[..2].iter().cloned().map(Ok), 4).unwrap();
        let right = first_pass(baskets[2..].iter().cloned().map(Ok), 4).unwrap();
        let merged = left.merge(right).unwrap();

        assert_eq!(merged.baskets_read(), whole.baskets_read());
        assert_eq!(merged.items(), whole.items());
        for bucket in 0..4 {
            assert_eq!(
                merged.buckets().count(bucket).unwrap(),
                whole.buckets().count(bucket).unwrap()
            );
        }
    }

    fn log_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn file_source_matches_in_memory() {
        let file = log_file("1 2 3 \n1 2 \n2 3 \n1 3 \n");
        let source = BasketSource::new(file.path());

        let from_file = pcy_file(&source, 4, &config(0.5)).unwrap();
        let in_memory = pcy(&four_baskets(), &config(0.5)).unwrap();

        assert_eq!(from_file.frequent_pairs, in_memory.frequent_pairs);
        assert_eq!(from_file.frequent_items, in_memory.frequent_items);
    }

    #[test]
    fn file_source_samples_first_records() {
        let file = log_file("1 2 \n1 2 \n3 4 \n3 4 \n3 4 \n");
        let source = BasketSource::new(file.path());

        let outcome = pcy_file(&source, 2, &config(1.0)).unwrap();
        assert_eq!(outcome.baskets_read, 2);
        assert_eq!(outcome.frequent_pairs, hashmap! { pair("1", "2") => 2 });

        let again = pcy_file(&source, 2, &config(1.0)).unwrap();
        assert_eq!(again.frequent_pairs, outcome.frequent_pairs);
        assert_eq!(again.frequent_items, outcome.frequent_items);
    }

    #[test]
    fn short_file_ends_gracefully() {
        let file = log_file("a b \na b \n\n");
        let source = BasketSource::new(file.path());

        let outcome = pcy_file(&source, 100, &config(0.5)).unwrap();
        assert_eq!(outcome.baskets_read, 3);
        assert_eq!(outcome.threshold.value(), 1.5);
        assert_eq!(outcome.frequent_pairs, hashmap! { pair("a", "b") => 2 });
    }

    #[test]
    fn missing_file_fails() {
        let source = BasketSource::new("/no/such/log.txt");
        assert!(matches!(
            pcy_file(&source, 10, &config(0.5)),
            Err(PcyError::Io { .. })
        ));
    }

    fn baskets_strategy() -> impl Strategy<Value = Vec<Basket>> {
        prop::collection::vec(prop::collection::vec(0u8..8, 0..6), 0..30).prop_map(|raw| {
            raw.into_iter()
                .map(|basket| basket.into_iter().map(|item| item.to_string()).collect())
                .collect()
        })
    }

    proptest! {
        #[test]
        fn output_is_exactly_the_frequent_pairs(
            baskets in baskets_strategy(),
            percent in 0u64..=100,
            num_buckets in 1usize..6,
        ) {
            let config = config(percent as f64 / 100.0)
                .with_buckets(BucketPolicy::Fixed(num_buckets));
            let outcome = pcy(&baskets, &config).unwrap();

            // integer comparison: count / n >= percent / 100
            let n = baskets.len() as u64;
            let expected: FrequentPairs = exact_pair_counts(&baskets)
                .into_iter()
                .filter(|&(_, count)| u64::from(count) * 100 >= percent * n)
                .collect();

            prop_assert_eq!(outcome.frequent_pairs, expected);
        }

        #[test]
        fn candidates_only_from_frequent_buckets(
            baskets in baskets_strategy(),
            support in 0.0f64..=1.0,
            num_buckets in 1usize..6,
        ) {
            let pass = first_pass(baskets.iter().cloned().map(Ok), num_buckets).unwrap();
            let threshold = Threshold::from_support(
                Fraction::new("support", support).unwrap(),
                pass.baskets_read(),
            );
            let frequent_items = pass.items().frequent_items(threshold);
            let mut buckets = pass.buckets().clone();
            buckets.compact(threshold).unwrap();

            let scanner = CandidatePairScanner::new(&frequent_items, &buckets).unwrap();
            let candidates = scanner.scan(baskets.iter().cloned().map(Ok)).unwrap();
            let again = scanner.scan(baskets.iter().cloned().map(Ok)).unwrap();
            prop_assert_eq!(&candidates, &again);

            for pair in candidates.keys() {
                prop_assert!(buckets.is_frequent_pair(pair.first(), pair.second()).unwrap());
                prop_assert!(frequent_items.contains(pair.first()));
                prop_assert!(frequent_items.contains(pair.second()));
            }
        }

        #[test]
        fn partitioned_run_matches_sequential(
            baskets in baskets_strategy(),
            support in 0.0f64..=1.0,
            num_buckets in 1usize..6,
        ) {
            let config = config(support).with_buckets(BucketPolicy::Fixed(num_buckets));
            let sequential = pcy(&baskets, &config).unwrap();
            let parallel = pcy_parallel(&baskets, &config).unwrap();

            prop_assert_eq!(sequential.frequent_pairs, parallel.frequent_pairs);
            prop_assert_eq!(sequential.candidate_pairs, parallel.candidate_pairs);
        }
    }
}
