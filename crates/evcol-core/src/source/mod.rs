//! Batch sources: the pull interface the ingestor consumes.
//!
//! A source yields time-windowed [`EventBatch`]es until it returns
//! `Ok(None)`. Decoding, windowing and any time bound are the source's own
//! business; the ingestor only sees "next batch or end of stream".

pub mod csv;

pub use csv::CsvEventSource;
pub use evcol_config::SourceConfig;

use crate::buffer::ShapeMismatch;
use std::collections::VecDeque;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a batch source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("decode error: {0}")]
    Decode(String),
}

/// One time window of raw events, as four columns at source width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBatch {
    pub x: Vec<i32>,
    pub y: Vec<i32>,
    pub p: Vec<i16>,
    pub t: Vec<i64>,
}

impl EventBatch {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            p: Vec::with_capacity(n),
            t: Vec::with_capacity(n),
        }
    }

    /// Number of events, or the column lengths if they disagree.
    pub fn validate(&self) -> Result<usize, ShapeMismatch> {
        let n = self.x.len();
        if self.y.len() == n && self.p.len() == n && self.t.len() == n {
            Ok(n)
        } else {
            Err(ShapeMismatch {
                x: self.x.len(),
                y: self.y.len(),
                p: self.p.len(),
                t: self.t.len(),
            })
        }
    }

    pub fn push(&mut self, x: i32, y: i32, p: i16, t: i64) {
        self.x.push(x);
        self.y.push(y);
        self.p.push(p);
        self.t.push(t);
    }

    /// Length of the `x` column; use [`validate`](Self::validate) for a checked count.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Blocking pull interface over time-windowed event batches.
pub trait BatchSource {
    /// Next batch, `Ok(None)` once the stream (or its time budget) is exhausted.
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError>;

    /// Short label for logs.
    fn describe(&self) -> String {
        "batch source".to_string()
    }
}

impl<S: BatchSource + ?Sized> BatchSource for &mut S {
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError> {
        (**self).next_batch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: BatchSource + ?Sized> BatchSource for Box<S> {
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError> {
        (**self).next_batch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// In-memory source replaying a fixed sequence of batches or errors.
#[derive(Debug, Default)]
pub struct VecSource {
    items: VecDeque<Result<EventBatch, SourceError>>,
}

impl VecSource {
    pub fn new(batches: Vec<EventBatch>) -> Self {
        Self {
            items: batches.into_iter().map(Ok).collect(),
        }
    }

    pub fn from_results(items: Vec<Result<EventBatch, SourceError>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl BatchSource for VecSource {
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError> {
        self.items.pop_front().transpose()
    }

    fn describe(&self) -> String {
        format!("in-memory source ({} pending)", self.items.len())
    }
}
