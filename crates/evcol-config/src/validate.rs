//! Semantic validation of a resolved [`PipelineConfig`].
//!
//! Validation collects every problem instead of stopping at the first, so a
//! `config validate` run reports the whole picture at once.

use crate::pipeline::PipelineConfig;
use serde::Serialize;
use std::fmt;

/// Coordinate offsets beyond this magnitude cannot produce a valid u16.
const MAX_OFFSET_MAGNITUDE: u64 = u16::MAX as u64;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors and warnings found in one config.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field,
            message: message.into(),
        });
    }
}

/// Check a config for values the pipeline cannot run with.
pub fn validate(config: &PipelineConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.capacity_hint == 0 {
        result.error("capacity_hint", "must be at least 1");
    } else if config.capacity_hint < 1024 {
        result.warnings.push(format!(
            "capacity_hint {} is very small; expect frequent buffer growth",
            config.capacity_hint
        ));
    }

    for (field, value) in [("x_offset", config.x_offset), ("y_offset", config.y_offset)] {
        if value.unsigned_abs() > MAX_OFFSET_MAGNITUDE {
            result.error(
                field,
                format!("{value} is outside [-{MAX_OFFSET_MAGNITUDE}, {MAX_OFFSET_MAGNITUDE}]"),
            );
        }
    }

    if config.source.delta_t <= 0 {
        result.error("source.delta_t", "must be positive");
    }
    if let Some(max) = config.source.max_duration {
        if max <= 0 {
            result.error("source.max_duration", "must be positive or null");
        }
    }
    if config.source.start_ts < 0 {
        result.error("source.start_ts", "must not be negative");
    }

    if !(1..=22).contains(&config.writer.compression_level) {
        result.error(
            "writer.compression_level",
            format!("{} is outside 1..=22", config.writer.compression_level),
        );
    }
    if config.writer.row_group_size == 0 {
        result.error("writer.row_group_size", "must be at least 1");
    }

    result
}
