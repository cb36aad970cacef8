//! Lazy attribute indexing for field collections.
//!
//! This crate sits between a raw field collection and consumers that need to
//! filter, group, or enumerate fields by metadata attributes without paying
//! a full metadata scan for every query:
//!
//! - [`IndexDb`] caches sorted unique attribute values per key and, for
//!   derived keys, their component breakdowns, with an explicit LRU capacity
//!   on distinct keys.
//! - [`IndexedFieldList`] wraps any [`field_core::FieldList`] plus an
//!   [`IndexDb`] and an optional remapping, and fills all missing keys of a
//!   query with exactly one pass over the underlying fields.
//!
//! # Example
//!
//! ```ignore
//! use field_index::IndexedFieldList;
//! use field_core::Remapping;
//!
//! let remapping = Remapping::from_yaml("shortName_levtype: \"{param}_{levtype}\"")?;
//! let indexed = IndexedFieldList::new(list, Some(remapping));
//!
//! // One scan fills both keys; later queries are cache hits.
//! let unique = indexed.unique_values(&["param", "step"], false)?;
//! ```

pub mod db;
pub mod indexed;

pub use db::{Collected, ComponentEntry, IndexDb, IndexEntry, IndexStats};
pub use indexed::{IndexedFieldList, UniqueValues};
