//! # bramm-types
//!
//! Plain tabular types shared by the bramm spatial toolkit.
//!
//! - **Values**: `Value`, a dynamically typed cell (number, text, date, ...)
//! - **Tables**: `PointTable`, ordered columns and ordered rows, each row
//!   carrying an opaque `RowId` so the original record can be recovered after
//!   a spatial operation.
//!
//! ## Examples
//!
//! ```rust
//! use bramm_types::table::PointTable;
//! use bramm_types::value::Value;
//!
//! let mut table = PointTable::new(vec!["longitude".into(), "latitude".into()]);
//! table.push(vec![Value::from(2.35), Value::from(48.85)]).unwrap();
//! assert_eq!(table.len(), 1);
//! ```

pub mod table;
pub mod value;

pub use table::{PointTable, Row, RowId};
pub use value::Value;
