// src/table/mod.rs

//! Turning HTML tables and lists into rows of typed values.
//!
//! [`RowAssembler`] fixes the row set of one container; fields from the
//! [`Field`] catalog are extracted column-wise and zipped into [`Row`]s.
//! [`join`] combines finished tables.

pub mod assembler;
pub mod columns;
pub mod extract;
pub mod fields;
pub mod filter;
pub mod join;
pub mod value;

pub use assembler::{ColumnOptions, RowAssembler};
pub use columns::{ColumnRef, ColumnResolver};
pub use fields::{select_fields, Field};
pub use filter::RowFilter;
pub use join::{first_per_key, join, sort_by_field};
pub use value::{Row, Table, Value};
