//! Pipeline entry point: source → ingest → truncate → columnar write.
//!
//! All errors are surfaced here and nowhere retried; a batch job over many
//! recordings decides per recording whether to skip or abort.

use crate::ingest::{IngestError, IngestStats, StreamIngestor};
use crate::source::{BatchSource, CsvEventSource, SourceError};
use evcol_config::{validate, PipelineConfig, ValidationError};
use evcol_store::{ColumnarWriter, WriteError, WriteSummary, WriterConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Unified error of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no input path configured")]
    MissingInput,

    #[error("no output path configured")]
    MissingOutput,

    #[error("invalid configuration: {}", format_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("cannot open source: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// What a completed run did.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub ingest: IngestStats,
    pub write: WriteSummary,
}

/// Run the pipeline for the input and output named in `config`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    let input = config.input.clone().ok_or(PipelineError::MissingInput)?;
    let output = config.output.clone().ok_or(PipelineError::MissingOutput)?;
    check_config(config)?;
    let source = CsvEventSource::open(&input, config.source)?;
    let mut report = convert_validated(source, output, config)?;
    report.input = Some(input);
    Ok(report)
}

/// Run the pipeline over an arbitrary batch source.
pub fn convert<S: BatchSource>(
    source: S,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError> {
    let output = config.output.clone().ok_or(PipelineError::MissingOutput)?;
    check_config(config)?;
    convert_validated(source, output, config)
}

fn convert_validated<S: BatchSource>(
    source: S,
    output: PathBuf,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError> {
    let ingested = StreamIngestor::from_config(config).run(source)?;
    let stats = ingested.stats;
    let write = write_buffer(&output, ingested.buffer, config)?;

    info!(
        target: "pipeline",
        output = %output.display(),
        events = stats.events,
        bytes = write.bytes,
        "Conversion complete"
    );

    Ok(PipelineReport {
        input: None,
        output,
        ingest: stats,
        write,
    })
}

fn check_config(config: &PipelineConfig) -> Result<(), PipelineError> {
    let result = validate(config);
    for warning in &result.warnings {
        warn!(target: "pipeline", "{warning}");
    }
    if result.is_ok() {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(result.errors))
    }
}

fn write_buffer(
    output: &Path,
    buffer: crate::buffer::TypedColumnBuffer,
    config: &PipelineConfig,
) -> Result<WriteSummary, WriteError> {
    let writer = ColumnarWriter::new(
        WriterConfig::default()
            .with_compression_level(config.writer.compression_level)
            .with_row_group_size(config.writer.row_group_size),
    );
    writer.write_columns(output, buffer.into_columns())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;
    use crate::source::{EventBatch, VecSource};
    use tempfile::tempdir;

    #[test]
    fn missing_paths_are_reported() {
        let config = PipelineConfig::default();
        assert!(matches!(
            run_pipeline(&config),
            Err(PipelineError::MissingInput)
        ));
        assert!(matches!(
            convert(VecSource::default(), &config),
            Err(PipelineError::MissingOutput)
        ));
    }

    #[test]
    fn missing_output_is_reported_before_opening_input() {
        let config = PipelineConfig {
            input: Some("/nonexistent/events.csv".into()),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            run_pipeline(&config),
            Err(PipelineError::MissingOutput)
        ));
    }

    #[test]
    fn invalid_config_is_rejected_before_ingesting() {
        let dir = tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.output = Some(dir.path().join("out.parquet"));
        config.capacity_hint = 0;

        let mut source = VecSource::new(vec![EventBatch::default()]);
        let err = convert(&mut source, &config).unwrap_err();
        assert_eq!(ExitCode::from(&err), ExitCode::ConfigError);
        assert!(err.to_string().contains("capacity_hint"));
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn source_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.parquet");
        let mut config = PipelineConfig::default();
        config.output = Some(output.clone());
        config.capacity_hint = 16;

        let source = VecSource::from_results(vec![Err(SourceError::Decode("eof".into()))]);
        let err = convert(source, &config).unwrap_err();
        assert_eq!(ExitCode::from(&err), ExitCode::SourceError);
        assert!(!output.exists());
    }
}
