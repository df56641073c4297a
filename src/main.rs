use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use pcy::{
    pcy_file, pcy_parallel, sample_size, BasketSource, BucketPolicy, Fraction, MinerConfig,
    PcyOutcome,
};
use tracing::info;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    FmtSubscriber,
};

/// Mine frequent item pairs from a basket file, one basket per line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Basket file to read.
    input: PathBuf,

    /// Fraction of the file's baskets to read, from the top.
    #[arg(long, default_value_t = 1.0)]
    sample: f64,

    /// Fraction of sampled baskets a pair must appear in.
    #[arg(long)]
    support: f64,

    /// Number of hash buckets for the first pass. Defaults to half the sample.
    #[arg(long)]
    buckets: Option<usize>,

    /// Character separating items within a basket.
    #[arg(long, default_value_t = ' ')]
    delimiter: char,

    /// Load the sample into memory and count partitions in parallel.
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args = Args::parse();
    let sample = Fraction::new("sample", args.sample)?;
    let support = Fraction::new("support", args.support)?;
    let buckets = args
        .buckets
        .map_or(BucketPolicy::HalfBaskets, BucketPolicy::Fixed);
    let config = MinerConfig::new(support)
        .with_buckets(buckets)
        .with_delimiter(args.delimiter);
    let source = BasketSource::new(&args.input).with_delimiter(config.delimiter);

    let started_at = Local::now();
    let start = Instant::now();
    info!(start = %started_at, "Mining started");

    let total_records = source.count_records()?;
    let num_baskets = sample_size(total_records, sample);
    info!(total_records, num_baskets, "Sampling baskets");

    let outcome = if args.parallel {
        let baskets = source
            .baskets(num_baskets)?
            .collect::<pcy::Result<Vec<_>>>()
            .with_context(|| format!("reading {}", args.input.display()))?;
        pcy_parallel(&baskets, &config)?
    } else {
        pcy_file(&source, num_baskets, &config)?
    };

    let elapsed = start.elapsed();
    let finished_at = Local::now();
    report(&outcome);
    info!(
        start = %started_at,
        end = %finished_at,
        elapsed = ?elapsed,
        "Done"
    );

    Ok(())
}

fn report(outcome: &PcyOutcome) {
    println!(
        "Baskets: {}, threshold: {} (quota {}), items: {} ({} frequent), buckets: {} ({} frequent)",
        outcome.baskets_read,
        outcome.threshold.value(),
        outcome.threshold.quota(),
        outcome.distinct_items,
        outcome.frequent_items.len(),
        outcome.num_buckets,
        outcome.frequent_buckets,
    );
    println!(
        "Frequent pairs: {} of {} candidates",
        outcome.frequent_pairs.len(),
        outcome.candidate_pairs
    );

    for (pair, count) in outcome
        .frequent_pairs
        .iter()
        .sorted_by(|(a, x), (b, y)| y.cmp(x).then_with(|| a.cmp(b)))
    {
        println!("{}: {}", pair, count);
    }
}
