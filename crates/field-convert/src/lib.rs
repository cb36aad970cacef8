//! Tabular and multi-dimensional array materialization of field
//! collections.
//!
//! Converters are selected by a field's declared data format through a
//! fixed capability lookup table, never by synthesizing behavior at call
//! time: each registered [`FieldConverter`] implements the same
//! `to_table`/`to_array` interface, and [`ConverterRegistry`] picks one by
//! format tag.

pub mod array;
pub mod registry;
pub mod table;

pub use array::FieldArrayData;
pub use registry::{ConverterRegistry, FieldConverter, GridConverter};
pub use table::FieldTable;
