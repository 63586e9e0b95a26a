//! evcol columnar storage.
//!
//! This crate provides:
//! - The Arrow schema of the four event columns (`x`, `y`, `p`, `t`)
//! - A chunked Parquet writer with per-column zstd compression
//! - A reader and a metadata inspector for written artifacts

pub mod columns;
pub mod reader;
pub mod schema;
pub mod writer;

pub use columns::{EventColumns, LengthMismatch};
pub use reader::{inspect, read_columns, ArtifactInfo, ColumnInfo, ReadError};
pub use schema::event_schema;
pub use writer::{ColumnarWriter, WriteError, WriteSummary, WriterConfig};

pub use evcol_config::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_ROW_GROUP_SIZE};
