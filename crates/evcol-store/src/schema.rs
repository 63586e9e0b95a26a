//! Arrow schema of the persisted event columns.
//!
//! The four columns are the entire persisted state. Downstream consumers
//! rely on the names and element types below; keep them stable.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// Horizontal position, offset-corrected.
pub const X: &str = "x";
/// Vertical position, offset-corrected.
pub const Y: &str = "y";
/// Polarity bit.
pub const P: &str = "p";
/// Timestamp in source time units.
pub const T: &str = "t";

/// Schema of an event artifact: `x: u16, y: u16, p: u8, t: i64`, all non-null.
pub fn event_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(X, DataType::UInt16, false),
        Field::new(Y, DataType::UInt16, false),
        Field::new(P, DataType::UInt8, false),
        Field::new(T, DataType::Int64, false),
    ]))
}
