//! Exit codes for the evcol CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//! They are stable; scripts looping over recordings rely on them.

use crate::pipeline::PipelineError;
use crate::ingest::IngestError;

/// Exit codes for evcol operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// Configuration error (missing paths, invalid values, bad config file)
    ConfigError = 10,

    /// Batch source could not be opened or failed mid-stream
    SourceError = 11,

    /// Batch violated the four-column shape contract
    ShapeError = 12,

    /// Coordinate out of range under the reject policy
    CoordinateError = 13,

    /// Writing or reading the columnar artifact failed
    IoError = 14,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }
}

impl From<&PipelineError> for ExitCode {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::MissingInput
            | PipelineError::MissingOutput
            | PipelineError::InvalidConfig(_) => ExitCode::ConfigError,
            PipelineError::Source(_) => ExitCode::SourceError,
            PipelineError::Ingest(IngestError::IngestionFailed { .. }) => ExitCode::SourceError,
            PipelineError::Ingest(IngestError::ShapeMismatch { .. }) => ExitCode::ShapeError,
            PipelineError::Ingest(IngestError::CoordinateUnderflow { .. }) => {
                ExitCode::CoordinateError
            }
            PipelineError::Write(_) => ExitCode::IoError,
        }
    }
}
