//! Growable typed column buffer.
//!
//! Four parallel arrays (`x`, `y`, `p`, `t`) plus a logical length. The
//! physical capacity grows in fixed increments equal to the initial hint,
//! not geometrically: the hint is meant to be close to the final event
//! count, so one or two increments are the common case.
//!
//! ```text
//! capacity: |<------- hint ------->|<------- hint ------->|
//! written:  |xxxxxxxxxxxxxxxxxxxxxx|xxxxxxx...............|
//!                                          ^ current_idx
//! ```

use evcol_store::{EventColumns, LengthMismatch};
use tracing::debug;

/// The four slices of a batch disagree on length.
pub type ShapeMismatch = LengthMismatch;

/// Four positionally correlated growable columns.
#[derive(Debug, Clone)]
pub struct TypedColumnBuffer {
    x: Vec<u16>,
    y: Vec<u16>,
    p: Vec<u8>,
    t: Vec<i64>,
    /// Number of valid events.
    current_idx: usize,
    /// Physical capacity reached through growth.
    capacity: usize,
    /// Growth increment.
    capacity_hint: usize,
    growth_events: usize,
}

/// Borrowed view of the logical contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSlices<'a> {
    pub x: &'a [u16],
    pub y: &'a [u16],
    pub p: &'a [u8],
    pub t: &'a [i64],
}

impl TypedColumnBuffer {
    /// Allocate four zeroed columns of `capacity_hint` elements.
    ///
    /// A hint of 0 is treated as 1 so that growth always makes progress.
    pub fn new(capacity_hint: usize) -> Self {
        let hint = capacity_hint.max(1);
        Self {
            x: vec![0; hint],
            y: vec![0; hint],
            p: vec![0; hint],
            t: vec![0; hint],
            current_idx: 0,
            capacity: hint,
            capacity_hint: hint,
            growth_events: 0,
        }
    }

    /// Logical length (`current_idx`).
    pub fn len(&self) -> usize {
        self.current_idx
    }

    pub fn is_empty(&self) -> bool {
        self.current_idx == 0
    }

    /// Physical capacity reached so far. Unchanged by [`truncate`](Self::truncate).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Number of `ensure_capacity` calls that had to grow the columns.
    pub fn growth_events(&self) -> usize {
        self.growth_events
    }

    /// Make room for `additional` more events.
    ///
    /// Grows in whole increments of the hint until the request fits.
    /// Values below `current_idx` are preserved; the new region is zeroed.
    pub fn ensure_capacity(&mut self, additional: usize) {
        let needed = self.current_idx + additional;
        if needed > self.capacity {
            let increments = (needed - self.capacity).div_ceil(self.capacity_hint);
            let previous = self.capacity;
            self.capacity += increments * self.capacity_hint;
            self.growth_events += 1;
            debug!(
                target: "ingest.growth",
                previous,
                capacity = self.capacity,
                increments,
                current_idx = self.current_idx,
                "Growing column buffer"
            );
        }
        // After a truncate the arrays can be shorter than `capacity`.
        if self.x.len() < needed {
            self.x.resize(self.capacity, 0);
            self.y.resize(self.capacity, 0);
            self.p.resize(self.capacity, 0);
            self.t.resize(self.capacity, 0);
        }
    }

    /// Append one batch of already-narrowed columns.
    pub fn append_batch(
        &mut self,
        xs: &[u16],
        ys: &[u16],
        ps: &[u8],
        ts: &[i64],
    ) -> Result<(), ShapeMismatch> {
        let n = xs.len();
        if ys.len() != n || ps.len() != n || ts.len() != n {
            return Err(ShapeMismatch {
                x: xs.len(),
                y: ys.len(),
                p: ps.len(),
                t: ts.len(),
            });
        }
        if n == 0 {
            return Ok(());
        }

        self.ensure_capacity(n);
        let range = self.current_idx..self.current_idx + n;
        self.x[range.clone()].copy_from_slice(xs);
        self.y[range.clone()].copy_from_slice(ys);
        self.p[range.clone()].copy_from_slice(ps);
        self.t[range].copy_from_slice(ts);
        self.current_idx += n;
        Ok(())
    }

    /// Cut all four columns to `current_idx` and release unused memory.
    pub fn truncate(&mut self) {
        let len = self.current_idx;
        self.x.truncate(len);
        self.y.truncate(len);
        self.p.truncate(len);
        self.t.truncate(len);
        self.x.shrink_to_fit();
        self.y.shrink_to_fit();
        self.p.shrink_to_fit();
        self.t.shrink_to_fit();
    }

    /// Logical contents, `[0, current_idx)` of each column.
    pub fn columns(&self) -> ColumnSlices<'_> {
        let n = self.current_idx;
        ColumnSlices {
            x: &self.x[..n],
            y: &self.y[..n],
            p: &self.p[..n],
            t: &self.t[..n],
        }
    }

    /// Truncate and hand the columns over to storage.
    pub fn into_columns(mut self) -> EventColumns {
        self.truncate();
        EventColumns {
            x: self.x,
            y: self.y,
            p: self.p,
            t: self.t,
        }
    }
}
