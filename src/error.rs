use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = PcyError> = std::result::Result<T, E>;

/// Lifecycle phase of a bucket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketPhase {
    Counting,
    Compacted,
}

impl Display for BucketPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketPhase::Counting => write!(f, "counting"),
            BucketPhase::Compacted => write!(f, "compacted"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PcyError {
    #[error("Failed to read transaction log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot {operation} while the bucket table is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: BucketPhase,
    },

    #[error("Bucket index {index} is out of range for a table of {num_buckets} buckets")]
    BucketOutOfRange { index: usize, num_buckets: usize },

    #[error("A bucket table needs at least one bucket")]
    NoBuckets,

    #[error("Cannot merge bucket tables of different sizes: {left} vs {right}")]
    BucketSizeMismatch { left: usize, right: usize },

    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },
}

impl PcyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PcyError::Io {
            path: path.into(),
            source,
        }
    }
}
