//! evcol core: ingest time-windowed event batches into compressed columns.
//!
//! ```text
//! BatchSource ──► StreamIngestor ──► CoordinateTransform ──► TypedColumnBuffer
//!                                                                  │ truncate
//!                                                                  ▼
//!                                              evcol_store::ColumnarWriter (Parquet)
//! ```
//!
//! The pipeline is single-threaded and synchronous. Each run owns its
//! buffer outright; independent recordings never share state.

pub mod buffer;
pub mod exit_codes;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod source;
pub mod transform;
pub mod triggers;

pub use buffer::{ColumnSlices, ShapeMismatch, TypedColumnBuffer};
pub use ingest::{IngestError, IngestOptions, IngestStats, Ingested, StreamIngestor};
pub use pipeline::{convert, run_pipeline, PipelineError, PipelineReport};
pub use source::{BatchSource, CsvEventSource, EventBatch, SourceConfig, SourceError, VecSource};
pub use transform::{apply, Axis, CoordinateOutOfRange, CoordinateTransform, UnderflowPolicy};
