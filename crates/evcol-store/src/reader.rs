//! Reading event artifacts back.

use crate::columns::EventColumns;
use crate::schema::{event_schema, P, T, X, Y};
use arrow::array::{Array, Int64Array, UInt16Array, UInt8Array};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::errors::ParquetError;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading an artifact.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parquet error reading {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("Arrow error reading {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    #[error("{} is not an event artifact: {message}", path.display())]
    Schema { path: PathBuf, message: String },
}

/// Per-column storage details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub compression: String,
    pub compressed_bytes: i64,
    pub uncompressed_bytes: i64,
}

/// Artifact summary read from the footer only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub rows: i64,
    pub row_groups: usize,
    pub columns: Vec<ColumnInfo>,
}

fn open_builder(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| ReadError::Parquet {
            path: path.to_path_buf(),
            source,
        })?;

    let expected = event_schema();
    let actual = builder.schema();
    if actual.fields().len() != expected.fields().len() {
        return Err(ReadError::Schema {
            path: path.to_path_buf(),
            message: format!(
                "expected {} columns, found {}",
                expected.fields().len(),
                actual.fields().len()
            ),
        });
    }
    for (want, got) in expected.fields().iter().zip(actual.fields().iter()) {
        if want.name() != got.name() || want.data_type() != got.data_type() {
            return Err(ReadError::Schema {
                path: path.to_path_buf(),
                message: format!(
                    "expected column {}: {}, found {}: {}",
                    want.name(),
                    want.data_type(),
                    got.name(),
                    got.data_type()
                ),
            });
        }
    }
    Ok(builder)
}

/// Read all four columns of an artifact into memory.
pub fn read_columns(path: &Path) -> Result<EventColumns, ReadError> {
    let builder = open_builder(path)?;
    let rows = usize::try_from(builder.metadata().file_metadata().num_rows()).unwrap_or(0);
    let reader = builder.build().map_err(|source| ReadError::Parquet {
        path: path.to_path_buf(),
        source,
    })?;

    let mut columns = EventColumns {
        x: Vec::with_capacity(rows),
        y: Vec::with_capacity(rows),
        p: Vec::with_capacity(rows),
        t: Vec::with_capacity(rows),
    };
    let mut batches = 0usize;
    for batch in reader {
        let batch = batch.map_err(|source| ReadError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        columns
            .x
            .extend_from_slice(column::<UInt16Array>(path, &batch, X)?.values());
        columns
            .y
            .extend_from_slice(column::<UInt16Array>(path, &batch, Y)?.values());
        columns
            .p
            .extend_from_slice(column::<UInt8Array>(path, &batch, P)?.values());
        columns
            .t
            .extend_from_slice(column::<Int64Array>(path, &batch, T)?.values());
        batches += 1;
    }
    debug!(target: "store.read", path = %path.display(), rows = columns.len(), batches, "Read event columns");
    Ok(columns)
}

fn column<'a, A: Array + 'static>(
    path: &Path,
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a A, ReadError> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<A>())
        .ok_or_else(|| ReadError::Schema {
            path: path.to_path_buf(),
            message: format!("column {name} missing or mistyped"),
        })
}

/// Summarize an artifact from its footer without decoding column data.
pub fn inspect(path: &Path) -> Result<ArtifactInfo, ReadError> {
    let builder = open_builder(path)?;
    let metadata = builder.metadata();
    let schema = builder.schema();

    let mut columns: Vec<ColumnInfo> = schema
        .fields()
        .iter()
        .map(|field| ColumnInfo {
            name: field.name().clone(),
            data_type: field.data_type().to_string(),
            compression: "none".to_string(),
            compressed_bytes: 0,
            uncompressed_bytes: 0,
        })
        .collect();

    for row_group in metadata.row_groups() {
        for (info, chunk) in columns.iter_mut().zip(row_group.columns()) {
            info.compression = codec_name(chunk.compression()).to_string();
            info.compressed_bytes += chunk.compressed_size();
            info.uncompressed_bytes += chunk.uncompressed_size();
        }
    }

    Ok(ArtifactInfo {
        path: path.to_path_buf(),
        rows: metadata.file_metadata().num_rows(),
        row_groups: metadata.num_row_groups(),
        columns,
    })
}

fn codec_name(compression: Compression) -> &'static str {
    match compression {
        Compression::UNCOMPRESSED => "none",
        Compression::SNAPPY => "snappy",
        Compression::GZIP(_) => "gzip",
        Compression::LZO => "lzo",
        Compression::BROTLI(_) => "brotli",
        Compression::LZ4 => "lz4",
        Compression::ZSTD(_) => "zstd",
        Compression::LZ4_RAW => "lz4_raw",
        #[allow(unreachable_patterns)]
        _ => "other",
    }
}
