use std::collections::HashMap;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::basket::BasketSource;
use crate::config::{sample_size, Fraction, MinerConfig};
use crate::error::PcyError;
use crate::itemsets::pcy::{pcy_file, pcy_parallel};
use crate::types::{Basket, FrequentPairs, Item};

type PyFrequentPairs = HashMap<(Item, Item), u32>;

impl From<PcyError> for PyErr {
    fn from(err: PcyError) -> PyErr {
        match err {
            PcyError::Io { .. } => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

fn convert_frequent_pairs(frequent_pairs: FrequentPairs) -> PyFrequentPairs {
    frequent_pairs
        .into_iter()
        .map(|(pair, count)| (pair.into_tuple(), count))
        .collect()
}

/// Frequent pairs of a list of baskets.
#[pyfunction]
#[pyo3(text_signature = "(baskets, min_support)")]
fn mine_pairs(py: Python<'_>, baskets: Vec<Basket>, min_support: f64) -> PyResult<PyFrequentPairs> {
    let config = MinerConfig::new(Fraction::new("min_support", min_support)?);
    let outcome = py.allow_threads(|| pcy_parallel(&baskets, &config))?;
    Ok(convert_frequent_pairs(outcome.frequent_pairs))
}

/// Frequent pairs of the first `sample` fraction of a basket file.
#[pyfunction]
#[pyo3(text_signature = "(path, sample, min_support, delimiter=' ')")]
fn mine_file(
    py: Python<'_>,
    path: &str,
    sample: f64,
    min_support: f64,
    delimiter: Option<char>,
) -> PyResult<PyFrequentPairs> {
    let sample = Fraction::new("sample", sample)?;
    let mut config = MinerConfig::new(Fraction::new("min_support", min_support)?);
    if let Some(delimiter) = delimiter {
        config = config.with_delimiter(delimiter);
    }
    let source = BasketSource::new(path).with_delimiter(config.delimiter);

    let outcome = py.allow_threads(|| {
        let num_baskets = sample_size(source.count_records()?, sample);
        pcy_file(&source, num_baskets, &config)
    })?;
    Ok(convert_frequent_pairs(outcome.frequent_pairs))
}

#[pymodule]
fn pcy(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(mine_pairs, m)?)?;
    m.add_function(wrap_pyfunction!(mine_file, m)?)?;
    Ok(())
}
