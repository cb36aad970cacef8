//! Shared test utilities for the fieldkit workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic fields with arbitrary attribute maps
//! - A forecast-shaped sample collection (param x levtype x step)
//! - A scan-counting field list for asserting how many passes a query cost
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod instrumented;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use instrumented::*;

/// Macro to compare a `Vec<AttrValue>` against literal values.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_values;
///
/// assert_values!(unique, ["2t", "msl"]);
/// assert_values!(steps, [0, 6, 12]);
/// ```
#[macro_export]
macro_rules! assert_values {
    ($actual:expr, [$($expected:expr),* $(,)?]) => {{
        let expected: Vec<field_core::AttrValue> =
            vec![$(field_core::AttrValue::from($expected)),*];
        assert_eq!($actual, expected);
    }};
}
