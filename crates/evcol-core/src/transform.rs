//! Coordinate normalization.
//!
//! The sensor's origin and the consumer's origin differ by a fixed
//! calibration offset, subtracted here once per event as batches arrive.
//! The subtraction happens in `i64`; the result is narrowed to `u16`
//! according to an [`UnderflowPolicy`].

use crate::source::EventBatch;
pub use evcol_config::UnderflowPolicy;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which coordinate went out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// An offset coordinate fell outside `[0, 65535]` under [`UnderflowPolicy::Reject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{axis} coordinate {value} out of u16 range at event {event_index} (raw {raw}, offset {offset})")]
pub struct CoordinateOutOfRange {
    pub axis: Axis,
    pub event_index: usize,
    pub raw: i64,
    pub offset: i64,
    pub value: i64,
}

/// Subtract the offsets and narrow with a truncating conversion.
///
/// `apply(5, 10, 340, 60)` yields `(65201, 65486)`: negative results wrap
/// modulo 2^16.
pub fn apply(x: i64, y: i64, x_offset: i64, y_offset: i64) -> (u16, u16) {
    (
        x.wrapping_sub(x_offset) as u16,
        y.wrapping_sub(y_offset) as u16,
    )
}

/// Per-run coordinate transform with a fixed offset pair and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateTransform {
    pub x_offset: i64,
    pub y_offset: i64,
    pub policy: UnderflowPolicy,
}

impl CoordinateTransform {
    pub fn new(x_offset: i64, y_offset: i64, policy: UnderflowPolicy) -> Self {
        Self {
            x_offset,
            y_offset,
            policy,
        }
    }

    /// Transform one coordinate pair. `event_index` is only used for error context.
    pub fn apply(
        &self,
        x: i64,
        y: i64,
        event_index: usize,
    ) -> Result<(u16, u16), CoordinateOutOfRange> {
        Ok((
            self.narrow(Axis::X, x, self.x_offset, event_index)?,
            self.narrow(Axis::Y, y, self.y_offset, event_index)?,
        ))
    }

    fn narrow(
        &self,
        axis: Axis,
        raw: i64,
        offset: i64,
        event_index: usize,
    ) -> Result<u16, CoordinateOutOfRange> {
        let value = raw.wrapping_sub(offset);
        match self.policy {
            UnderflowPolicy::Wrap => Ok(value as u16),
            UnderflowPolicy::Clamp => Ok(value.clamp(0, i64::from(u16::MAX)) as u16),
            UnderflowPolicy::Reject => u16::try_from(value).map_err(|_| CoordinateOutOfRange {
                axis,
                event_index,
                raw,
                offset,
                value,
            }),
        }
    }

    /// Transform a whole batch into the scratch columns, replacing their contents.
    pub fn transform_batch(
        &self,
        batch: &EventBatch,
        xs: &mut Vec<u16>,
        ys: &mut Vec<u16>,
    ) -> Result<(), CoordinateOutOfRange> {
        xs.clear();
        ys.clear();
        xs.reserve(batch.x.len());
        ys.reserve(batch.y.len());

        if self.policy == UnderflowPolicy::Wrap {
            xs.extend(batch.x.iter().map(|&x| i64::from(x).wrapping_sub(self.x_offset) as u16));
            ys.extend(batch.y.iter().map(|&y| i64::from(y).wrapping_sub(self.y_offset) as u16));
            return Ok(());
        }

        for (i, (&x, &y)) in batch.x.iter().zip(&batch.y).enumerate() {
            let (tx, ty) = self.apply(i64::from(x), i64::from(y), i)?;
            xs.push(tx);
            ys.push(ty);
        }
        Ok(())
    }
}

/// Narrow polarity with a truncating conversion.
pub fn narrow_polarity(ps: &[i16], out: &mut Vec<u8>) {
    out.clear();
    out.extend(ps.iter().map(|&p| p as u8));
}
