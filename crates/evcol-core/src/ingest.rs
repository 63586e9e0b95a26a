//! Stream ingestion: drive a batch source to completion into a column buffer.
//!
//! ```text
//! BatchSource::next_batch() ──► validate shape ──► CoordinateTransform
//!        ▲                                              │
//!        └──────── until Ok(None) ◄── append_batch ◄────┘
//! ```
//!
//! Any failure aborts the run and drops the partially filled buffer; the
//! caller never gets a partial result to flush.

use crate::buffer::{ShapeMismatch, TypedColumnBuffer};
use crate::source::{BatchSource, SourceError};
use crate::transform::{narrow_polarity, CoordinateOutOfRange, CoordinateTransform};
use evcol_config::PipelineConfig;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("batch {batch_index} has mismatched columns: {mismatch}")]
    ShapeMismatch {
        batch_index: usize,
        #[source]
        mismatch: ShapeMismatch,
    },

    #[error("batch {batch_index}: {source}")]
    CoordinateUnderflow {
        batch_index: usize,
        #[source]
        source: CoordinateOutOfRange,
    },

    #[error("ingestion failed at batch {batch_index}: {cause}")]
    IngestionFailed {
        batch_index: usize,
        #[source]
        cause: SourceError,
    },
}

/// Ingestion parameters.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Initial allocation and growth increment of the buffer.
    pub capacity_hint: usize,
    pub transform: CoordinateTransform,
    /// Emit a progress line every this many batches (0 disables).
    pub progress_every: usize,
}

impl IngestOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            capacity_hint: config.capacity_hint,
            transform: CoordinateTransform::new(config.x_offset, config.y_offset, config.underflow),
            progress_every: 10,
        }
    }
}

/// Counters from a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub batches: usize,
    pub empty_batches: usize,
    pub events: usize,
    pub growth_events: usize,
    pub capacity: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Result of a successful run: the truncated buffer and its counters.
#[derive(Debug)]
pub struct Ingested {
    pub buffer: TypedColumnBuffer,
    pub stats: IngestStats,
}

/// Pulls every batch from a source into one [`TypedColumnBuffer`].
#[derive(Debug, Clone)]
pub struct StreamIngestor {
    options: IngestOptions,
}

impl StreamIngestor {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(IngestOptions::from_config(config))
    }

    /// Consume `source` until it signals end of stream.
    pub fn run<S: BatchSource>(&self, mut source: S) -> Result<Ingested, IngestError> {
        let started = Instant::now();
        let transform = self.options.transform;
        let mut buffer = TypedColumnBuffer::new(self.options.capacity_hint);
        let mut stats = IngestStats::default();

        let (mut xs, mut ys, mut ps) = (Vec::new(), Vec::new(), Vec::new());

        debug!(
            target: "ingest.run",
            source = %source.describe(),
            capacity_hint = buffer.capacity_hint(),
            x_offset = transform.x_offset,
            y_offset = transform.y_offset,
            policy = %transform.policy,
            "Starting ingestion"
        );

        loop {
            let batch_index = stats.batches;
            let batch = match source.next_batch() {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(cause) => {
                    return Err(IngestError::IngestionFailed { batch_index, cause });
                }
            };
            stats.batches += 1;

            let n = batch
                .validate()
                .map_err(|mismatch| IngestError::ShapeMismatch {
                    batch_index,
                    mismatch,
                })?;
            if n == 0 {
                stats.empty_batches += 1;
                continue;
            }

            transform
                .transform_batch(&batch, &mut xs, &mut ys)
                .map_err(|source| IngestError::CoordinateUnderflow {
                    batch_index,
                    source,
                })?;
            narrow_polarity(&batch.p, &mut ps);

            buffer.ensure_capacity(n);
            buffer
                .append_batch(&xs, &ys, &ps, &batch.t)
                .map_err(|mismatch| IngestError::ShapeMismatch {
                    batch_index,
                    mismatch,
                })?;

            if self.options.progress_every > 0 && stats.batches % self.options.progress_every == 0 {
                debug!(
                    target: "ingest.progress",
                    batches = stats.batches,
                    events = buffer.len(),
                    capacity = buffer.capacity(),
                    "Ingestion progress"
                );
            }
        }

        buffer.truncate();
        stats.events = buffer.len();
        stats.growth_events = buffer.growth_events();
        stats.capacity = buffer.capacity();
        stats.elapsed = started.elapsed();

        info!(
            target: "ingest.run",
            batches = stats.batches,
            empty_batches = stats.empty_batches,
            events = stats.events,
            growth_events = stats.growth_events,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Ingestion complete"
        );

        Ok(Ingested { buffer, stats })
    }
}
