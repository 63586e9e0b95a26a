//! Chunked Parquet writer for event columns.
//!
//! The columns are moved into Arrow arrays without copying, written in row
//! groups of at most `row_group_size` rows, each column chunk compressed
//! with zstd at a low level. Output goes to a hidden sibling file that is
//! renamed over the target once the footer is written, so readers never see
//! a half-written artifact under the final name. A crash during the rename
//! window can still leave the temporary file behind.

use crate::columns::EventColumns;
use crate::schema::event_schema;
use crate::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_ROW_GROUP_SIZE};
use arrow::array::{ArrayRef, Int64Array, UInt16Array, UInt8Array};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Errors from writing an artifact.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("column lengths differ writing {}: x={x}, y={y}, p={p}, t={t}", path.display())]
    ColumnLength {
        path: PathBuf,
        x: usize,
        y: usize,
        p: usize,
        t: usize,
    },

    #[error("invalid output path: {}", path.display())]
    InvalidPath { path: PathBuf },

    #[error("invalid zstd level {level}: {source}")]
    CompressionLevel {
        level: i32,
        #[source]
        source: ParquetError,
    },

    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Arrow error writing {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    #[error("Parquet error writing {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },
}

/// Writer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// zstd level for every column chunk.
    pub compression_level: i32,
    /// Maximum rows per row group.
    pub row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

impl WriterConfig {
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn with_row_group_size(mut self, rows: usize) -> Self {
        self.row_group_size = rows;
        self
    }
}

/// What a successful write produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub row_groups: usize,
    pub bytes: u64,
}

/// Persists event columns to a single Parquet artifact.
#[derive(Debug, Clone, Default)]
pub struct ColumnarWriter {
    config: WriterConfig,
}

impl ColumnarWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write four columns to `path`, creating or replacing it.
    pub fn write(
        &self,
        path: &Path,
        x: Vec<u16>,
        y: Vec<u16>,
        p: Vec<u8>,
        t: Vec<i64>,
    ) -> Result<WriteSummary, WriteError> {
        self.write_columns(path, EventColumns { x, y, p, t })
    }

    /// Write an [`EventColumns`] bundle to `path`, creating or replacing it.
    pub fn write_columns(
        &self,
        path: &Path,
        columns: EventColumns,
    ) -> Result<WriteSummary, WriteError> {
        let rows = columns
            .check_lengths()
            .map_err(|m| WriteError::ColumnLength {
                path: path.to_path_buf(),
                x: m.x,
                y: m.y,
                p: m.p,
                t: m.t,
            })?;

        let level = ZstdLevel::try_new(self.config.compression_level).map_err(|source| {
            WriteError::CompressionLevel {
                level: self.config.compression_level,
                source,
            }
        })?;
        let row_group_size = self.config.row_group_size.max(1);
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .set_max_row_group_size(row_group_size)
            .build();

        let schema = event_schema();
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(UInt16Array::from(columns.x)),
            Arc::new(UInt16Array::from(columns.y)),
            Arc::new(UInt8Array::from(columns.p)),
            Arc::new(Int64Array::from(columns.t)),
        ];
        let batch =
            RecordBatch::try_new(schema.clone(), arrays).map_err(|source| WriteError::Arrow {
                path: path.to_path_buf(),
                source,
            })?;

        let tmp = partial_path(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| WriteError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let started = Instant::now();
        let row_groups = match write_chunks(&tmp, &batch, props, row_group_size) {
            Ok(groups) => groups,
            Err(err) => {
                discard_partial(&tmp);
                return Err(err);
            }
        };

        if let Err(source) = fs::rename(&tmp, path) {
            discard_partial(&tmp);
            return Err(WriteError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        let bytes = fs::metadata(path)
            .map_err(|source| WriteError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        info!(
            target: "store.write",
            path = %path.display(),
            rows,
            row_groups,
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Wrote event columns"
        );

        Ok(WriteSummary {
            path: path.to_path_buf(),
            rows,
            row_groups,
            bytes,
        })
    }
}

fn write_chunks(
    tmp: &Path,
    batch: &RecordBatch,
    props: WriterProperties,
    row_group_size: usize,
) -> Result<usize, WriteError> {
    let io_err = |source| WriteError::Io {
        path: tmp.to_path_buf(),
        source,
    };
    let pq_err = |source| WriteError::Parquet {
        path: tmp.to_path_buf(),
        source,
    };

    let file = File::create(tmp).map_err(io_err)?;
    let mut writer =
        ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props)).map_err(pq_err)?;

    let rows = batch.num_rows();
    let mut offset = 0;
    let mut row_groups = 0;
    while offset < rows {
        let len = row_group_size.min(rows - offset);
        writer.write(&batch.slice(offset, len)).map_err(pq_err)?;
        // Close the row group here so each chunk is independently seekable.
        writer.flush().map_err(pq_err)?;
        trace!(target: "store.write", offset, len, "Flushed row group");
        offset += len;
        row_groups += 1;
    }

    let mut buf = writer.into_inner().map_err(pq_err)?;
    buf.flush().map_err(io_err)?;
    let file = buf.into_inner().map_err(|e| io_err(e.into_error()))?;
    file.sync_all().map_err(io_err)?;
    debug!(target: "store.write", path = %tmp.display(), rows, row_groups, "Finalized partial file");
    Ok(row_groups)
}

/// `dir/name.parquet` → `dir/.name.parquet.partial`
fn partial_path(path: &Path) -> Result<PathBuf, WriteError> {
    let name = path
        .file_name()
        .ok_or_else(|| WriteError::InvalidPath {
            path: path.to_path_buf(),
        })?
        .to_string_lossy();
    Ok(path.with_file_name(format!(".{name}.partial")))
}

fn discard_partial(tmp: &Path) {
    if let Err(err) = fs::remove_file(tmp) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %tmp.display(), error = %err, "Failed to remove partial artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_path_is_hidden_sibling() {
        let tmp = partial_path(Path::new("/data/out/1.parquet")).unwrap();
        assert_eq!(tmp, PathBuf::from("/data/out/.1.parquet.partial"));
        assert!(matches!(
            partial_path(Path::new("/")),
            Err(WriteError::InvalidPath { .. })
        ));
    }

    #[test]
    fn ragged_columns_are_rejected_before_touching_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.parquet");
        let err = ColumnarWriter::default()
            .write(&path, vec![1, 2], vec![1], vec![0, 1], vec![1, 2])
            .unwrap_err();
        assert!(matches!(err, WriteError::ColumnLength { y: 1, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn invalid_compression_level_is_reported() {
        let dir = tempdir().unwrap();
        let writer = ColumnarWriter::new(WriterConfig::default().with_compression_level(99));
        let err = writer
            .write(&dir.path().join("x.parquet"), vec![], vec![], vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, WriteError::CompressionLevel { level: 99, .. }));
    }

    #[test]
    fn row_groups_follow_chunk_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunks.parquet");
        let n = 10usize;
        let writer = ColumnarWriter::new(WriterConfig::default().with_row_group_size(4));
        let summary = writer
            .write(
                &path,
                (0..n as u16).collect(),
                (0..n as u16).collect(),
                vec![1; n],
                (0..n as i64).collect(),
            )
            .unwrap();
        assert_eq!(summary.rows, 10);
        assert_eq!(summary.row_groups, 3);
        assert!(summary.bytes > 0);
        assert!(!dir.path().join(".chunks.parquet.partial").exists());
    }

    #[test]
    fn summary_bytes_match_file_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sized.parquet");
        let summary = ColumnarWriter::default()
            .write(&path, vec![3, 4], vec![5, 6], vec![0, 1], vec![10, 20])
            .unwrap();
        assert_eq!(summary.bytes, fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn defaults_agree_with_pipeline_settings() {
        let settings = evcol_config::WriterSettings::default();
        let config = WriterConfig::default();
        assert_eq!(config.compression_level, settings.compression_level);
        assert_eq!(config.row_group_size, settings.row_group_size);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1.10").join("3.parquet");
        ColumnarWriter::default()
            .write(&path, vec![1], vec![2], vec![0], vec![9])
            .unwrap();
        assert!(path.is_file());
    }
}
