//! Core types for collections of gridded weather data records ("fields").
//!
//! A [`Field`] is one data record exposing metadata attributes (parameter,
//! level type, forecast step, ...) and a grid of values. A [`FieldList`] is
//! an ordered collection of fields that can be filtered with a [`Selection`]
//! and reordered with an [`OrderSpec`].
//!
//! Derived attributes are supported via a [`Remapping`]: a template such as
//! `"{param}_{levtype}"` combines several native attributes into a single
//! queryable label, and the [`CollectorJoiner`] captures which raw component
//! values produced each label.

pub mod error;
pub mod field;
pub mod fieldlist;
pub mod joiner;
pub mod remapping;
pub mod selection;
pub mod value;

// Re-export commonly used types at the crate root
pub use error::{FieldError, FieldResult};
pub use field::{DataType, Field, FieldOverlay, FieldValues};
pub use fieldlist::{Direction, FieldIter, FieldList, OrderKey, OrderSpec, SimpleFieldList};
pub use joiner::CollectorJoiner;
pub use remapping::{extract_attributes, ExtractedValue, Remapping, RemappingSpec, Template};
pub use selection::{Matcher, Selection, SelectionSpec, SelectionValue};
pub use value::AttrValue;
