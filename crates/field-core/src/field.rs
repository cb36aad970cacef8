//! The field interface and the metadata overlay wrapper.
//!
//! A field is one gridded data record. The indexing layer only needs three
//! capabilities from it: attribute lookup by key, access to the value grid,
//! and its declared data format (used to pick a converter). Everything else
//! (decoding, projection, units) belongs to the format-specific reader that
//! produced the field.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::AttrValue;

/// Requested element type for a field's value grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 32-bit floats (native width for most GRIB2 packings).
    F32,
    /// 64-bit floats.
    F64,
}

/// A field's value grid in the requested element type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl FieldValues {
    /// Number of grid points.
    pub fn len(&self) -> usize {
        match self {
            FieldValues::F32(v) => v.len(),
            FieldValues::F64(v) => v.len(),
        }
    }

    /// Check whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into a `Vec<f64>` regardless of stored width.
    pub fn into_f64(self) -> Vec<f64> {
        match self {
            FieldValues::F32(v) => v.into_iter().map(f64::from).collect(),
            FieldValues::F64(v) => v,
        }
    }
}

/// One gridded data record.
///
/// Implementations are provided by format-specific readers; the indexing
/// layer never mutates a field.
pub trait Field: Send + Sync {
    /// Extract a single native metadata attribute. `None` if the field does
    /// not carry the attribute.
    fn attribute(&self, key: &str) -> Option<AttrValue>;

    /// The field's value grid in the requested element type.
    fn values(&self, dtype: DataType) -> FieldValues;

    /// Declared data format tag (e.g. "grib", "netcdf"). Used to select a
    /// converter for tabular/array materialization.
    fn data_format(&self) -> &str;
}

/// A field decorated with overriding metadata and, optionally, replacement
/// values.
///
/// Attribute lookups consult the override map first and fall back to the
/// base field for any unset key; `values` returns the replacement grid when
/// one was supplied. This is the only supported way to overlay extra
/// metadata onto an existing field.
pub struct FieldOverlay {
    base: Arc<dyn Field>,
    overrides: HashMap<String, AttrValue>,
    values: Option<FieldValues>,
}

impl FieldOverlay {
    /// Wrap `base` with an override attribute map.
    pub fn new(base: Arc<dyn Field>, overrides: HashMap<String, AttrValue>) -> Self {
        Self {
            base,
            overrides,
            values: None,
        }
    }

    /// Wrap `base`, also replacing its value grid.
    pub fn with_values(
        base: Arc<dyn Field>,
        overrides: HashMap<String, AttrValue>,
        values: FieldValues,
    ) -> Self {
        Self {
            base,
            overrides,
            values: Some(values),
        }
    }

    /// Whether this overlay replaces the base field's values.
    pub fn has_new_values(&self) -> bool {
        self.values.is_some()
    }
}

impl Field for FieldOverlay {
    fn attribute(&self, key: &str) -> Option<AttrValue> {
        if let Some(v) = self.overrides.get(key) {
            return Some(v.clone());
        }
        self.base.attribute(key)
    }

    fn values(&self, dtype: DataType) -> FieldValues {
        match &self.values {
            Some(FieldValues::F32(v)) => match dtype {
                DataType::F32 => FieldValues::F32(v.clone()),
                DataType::F64 => FieldValues::F64(v.iter().map(|x| f64::from(*x)).collect()),
            },
            Some(FieldValues::F64(v)) => match dtype {
                DataType::F32 => FieldValues::F32(v.iter().map(|x| *x as f32).collect()),
                DataType::F64 => FieldValues::F64(v.clone()),
            },
            None => self.base.values(dtype),
        }
    }

    fn data_format(&self) -> &str {
        self.base.data_format()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubField;

    impl Field for StubField {
        fn attribute(&self, key: &str) -> Option<AttrValue> {
            match key {
                "param" => Some(AttrValue::from("2t")),
                "levtype" => Some(AttrValue::from("sfc")),
                _ => None,
            }
        }

        fn values(&self, dtype: DataType) -> FieldValues {
            match dtype {
                DataType::F32 => FieldValues::F32(vec![1.0, 2.0]),
                DataType::F64 => FieldValues::F64(vec![1.0, 2.0]),
            }
        }

        fn data_format(&self) -> &str {
            "grib"
        }
    }

    #[test]
    fn test_overlay_overrides_then_falls_back() {
        let mut overrides = HashMap::new();
        overrides.insert("param".to_string(), AttrValue::from("msl"));
        let overlay = FieldOverlay::new(Arc::new(StubField), overrides);

        assert_eq!(overlay.attribute("param"), Some(AttrValue::from("msl")));
        assert_eq!(overlay.attribute("levtype"), Some(AttrValue::from("sfc")));
        assert_eq!(overlay.attribute("step"), None);
        assert!(!overlay.has_new_values());
    }

    #[test]
    fn test_overlay_replacement_values() {
        let overlay = FieldOverlay::with_values(
            Arc::new(StubField),
            HashMap::new(),
            FieldValues::F64(vec![9.0]),
        );
        assert!(overlay.has_new_values());
        assert_eq!(overlay.values(DataType::F64), FieldValues::F64(vec![9.0]));
        assert_eq!(overlay.values(DataType::F32), FieldValues::F32(vec![9.0]));
    }

    #[test]
    fn test_field_values_into_f64() {
        assert_eq!(
            FieldValues::F32(vec![1.5, 2.5]).into_f64(),
            vec![1.5_f64, 2.5_f64]
        );
    }
}
