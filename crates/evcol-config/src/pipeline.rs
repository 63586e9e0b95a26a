//! Pipeline configuration types.
//!
//! Every tunable of a conversion run lives here. Nothing in the library
//! crates reads process-wide defaults; the entry point resolves one
//! [`PipelineConfig`] and hands it down.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default x calibration offset subtracted from raw sensor coordinates.
pub const DEFAULT_X_OFFSET: i64 = 340;

/// Default y calibration offset subtracted from raw sensor coordinates.
pub const DEFAULT_Y_OFFSET: i64 = 60;

/// Default capacity hint: 60 s at roughly one million events per second.
pub const DEFAULT_CAPACITY_HINT: usize = 60_000_000;

/// Default window width per batch, in source time units (µs).
pub const DEFAULT_DELTA_T: i64 = 1_000_000;

/// Default total span consumed from the source, in source time units (µs).
pub const DEFAULT_MAX_DURATION: i64 = 60_000_000;

/// Default zstd level for column chunks. Low on purpose: throughput over ratio.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 1;

/// Default Parquet row group size (rows per chunk).
pub const DEFAULT_ROW_GROUP_SIZE: usize = 1024 * 1024;

/// Complete configuration of one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input event stream (path understood by the batch source).
    pub input: Option<PathBuf>,

    /// Output artifact path.
    pub output: Option<PathBuf>,

    /// Subtracted from every raw x coordinate.
    pub x_offset: i64,

    /// Subtracted from every raw y coordinate.
    pub y_offset: i64,

    /// Initial allocation and growth increment, in events.
    ///
    /// Performance hint only; any value ≥ 1 produces identical output.
    pub capacity_hint: usize,

    /// What to do when an offset coordinate falls outside `[0, 65535]`.
    pub underflow: UnderflowPolicy,

    /// Pass-through options for the batch source.
    pub source: SourceConfig,

    /// Columnar writer settings.
    pub writer: WriterSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            x_offset: DEFAULT_X_OFFSET,
            y_offset: DEFAULT_Y_OFFSET,
            capacity_hint: DEFAULT_CAPACITY_HINT,
            underflow: UnderflowPolicy::default(),
            source: SourceConfig::default(),
            writer: WriterSettings::default(),
        }
    }
}

/// Windowing options forwarded to the batch source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SourceConfig {
    /// First timestamp of the first window.
    pub start_ts: i64,

    /// Time span covered by one batch.
    pub delta_t: i64,

    /// Total time span to consume. `null` reads to the end of the stream.
    pub max_duration: Option<i64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            start_ts: 0,
            delta_t: DEFAULT_DELTA_T,
            max_duration: Some(DEFAULT_MAX_DURATION),
        }
    }
}

/// Columnar writer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WriterSettings {
    /// zstd level (1-22).
    pub compression_level: i32,

    /// Maximum rows per row group.
    pub row_group_size: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

/// Handling of offset coordinates that do not fit an unsigned 16-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnderflowPolicy {
    /// Truncating conversion: -335 becomes 65201.
    #[default]
    Wrap,
    /// Saturate into `[0, 65535]`.
    Clamp,
    /// Abort the run with a coordinate error.
    Reject,
}

impl fmt::Display for UnderflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnderflowPolicy::Wrap => write!(f, "wrap"),
            UnderflowPolicy::Clamp => write!(f, "clamp"),
            UnderflowPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for UnderflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrap" => Ok(UnderflowPolicy::Wrap),
            "clamp" => Ok(UnderflowPolicy::Clamp),
            "reject" => Ok(UnderflowPolicy::Reject),
            other => Err(format!(
                "unknown underflow policy '{other}' (expected wrap, clamp or reject)"
            )),
        }
    }
}
