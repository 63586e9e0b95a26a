//! Owned event columns handed from ingestion to storage.

use serde::Serialize;
use thiserror::Error;

/// The four columns disagree on length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("column lengths differ: x={x}, y={y}, p={p}, t={t}")]
pub struct LengthMismatch {
    pub x: usize,
    pub y: usize,
    pub p: usize,
    pub t: usize,
}

/// Four positionally correlated columns: index `i` across all four is one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventColumns {
    pub x: Vec<u16>,
    pub y: Vec<u16>,
    pub p: Vec<u8>,
    pub t: Vec<i64>,
}

impl EventColumns {
    /// Bundle four columns, rejecting unequal lengths.
    pub fn new(
        x: Vec<u16>,
        y: Vec<u16>,
        p: Vec<u8>,
        t: Vec<i64>,
    ) -> Result<Self, LengthMismatch> {
        let columns = Self { x, y, p, t };
        columns.check_lengths()?;
        Ok(columns)
    }

    /// Common length of the four columns.
    pub fn check_lengths(&self) -> Result<usize, LengthMismatch> {
        let n = self.x.len();
        if self.y.len() == n && self.p.len() == n && self.t.len() == n {
            Ok(n)
        } else {
            Err(LengthMismatch {
                x: self.x.len(),
                y: self.y.len(),
                p: self.p.len(),
                t: self.t.len(),
            })
        }
    }

    /// Number of events (length of the `x` column).
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
