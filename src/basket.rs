use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PcyError, Result};
use crate::types::Basket;

pub const DEFAULT_DELIMITER: char = ' ';

/// Splits one record into its items.
///
/// Records in the log end every item with the delimiter, so the empty token
/// after the final delimiter is not an item. Blank records give an empty basket.
pub fn parse_basket(record: &str, delimiter: char) -> Basket {
    let record = record.trim_end_matches(&['\n', '\r'][..]);
    let mut items: Basket = record.split(delimiter).map(str::to_owned).collect();
    if items.last().map_or(false, |item| item.is_empty()) {
        items.pop();
    }
    items
}

/// A transaction log on disk, one basket per line.
///
/// Every call to [`BasketSource::baskets`] reopens the file, so two passes over
/// the same source always see the same sequence.
#[derive(Debug, Clone)]
pub struct BasketSource {
    path: PathBuf,
    delimiter: char,
}

impl BasketSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BasketSource {
            path: path.into(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Reads up to `limit` baskets from the start of the log.
    pub fn baskets(&self, limit: usize) -> Result<Baskets<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| PcyError::io(&self.path, e))?;
        debug!(path = %self.path.display(), limit, "Opened transaction log");
        Ok(Baskets {
            lines: BufReader::new(file).lines(),
            delimiter: self.delimiter,
            remaining: limit,
            origin: self.path.clone(),
        })
    }

    /// Number of records in the whole log.
    pub fn count_records(&self) -> Result<usize> {
        let file = File::open(&self.path).map_err(|e| PcyError::io(&self.path, e))?;
        let mut total = 0;
        for line in BufReader::new(file).lines() {
            line.map_err(|e| PcyError::io(&self.path, e))?;
            total += 1;
        }
        Ok(total)
    }
}

/// Lazy, bounded sequence of baskets read from a log.
///
/// Stops after `limit` records or at end of data, whichever comes first. A
/// read error is yielded once and ends the sequence.
pub struct Baskets<R> {
    lines: Lines<R>,
    delimiter: char,
    remaining: usize,
    origin: PathBuf,
}

impl<R: BufRead> Baskets<R> {
    pub fn from_reader(reader: R, delimiter: char, limit: usize) -> Self {
        Baskets {
            lines: reader.lines(),
            delimiter,
            remaining: limit,
            origin: PathBuf::from("<reader>"),
        }
    }
}

impl<R: BufRead> Iterator for Baskets<R> {
    type Item = Result<Basket>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.lines.next() {
            Some(Ok(line)) => {
                self.remaining -= 1;
                Some(Ok(parse_basket(&line, self.delimiter)))
            }
            Some(Err(e)) => {
                self.remaining = 0;
                Some(Err(PcyError::io(&self.origin, e)))
            }
            None => {
                debug!(
                    origin = %self.origin.display(),
                    unread = self.remaining,
                    "Transaction log ended before the requested number of baskets"
                );
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
