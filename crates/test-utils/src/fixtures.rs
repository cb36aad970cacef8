//! Synthetic fields and sample collections.

use std::collections::HashMap;
use std::sync::Arc;

use field_core::{AttrValue, DataType, Field, FieldValues, SimpleFieldList};

/// A field backed by an explicit attribute map. The workhorse test double
/// for anything that consumes the `Field` trait.
#[derive(Debug, Clone, Default)]
pub struct TestField {
    attrs: HashMap<String, AttrValue>,
    data: Vec<f64>,
    format: String,
}

impl TestField {
    pub fn new() -> Self {
        Self {
            attrs: HashMap::new(),
            data: vec![0.0; 4],
            format: "grib".to_string(),
        }
    }

    /// Set one attribute.
    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Replace the value grid.
    pub fn with_data(mut self, data: Vec<f64>) -> Self {
        self.data = data;
        self
    }

    /// Replace the declared data format.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    pub fn into_arc(self) -> Arc<dyn Field> {
        Arc::new(self)
    }
}

impl Field for TestField {
    fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.attrs.get(key).cloned()
    }

    fn values(&self, dtype: DataType) -> FieldValues {
        match dtype {
            DataType::F32 => FieldValues::F32(self.data.iter().map(|x| *x as f32).collect()),
            DataType::F64 => FieldValues::F64(self.data.clone()),
        }
    }

    fn data_format(&self) -> &str {
        &self.format
    }
}

/// Build a list from attribute tuples, one field per row.
pub fn fields_from_attrs(rows: &[&[(&str, AttrValue)]]) -> SimpleFieldList {
    let fields = rows
        .iter()
        .map(|row| {
            let mut field = TestField::new();
            for (key, value) in row.iter() {
                field = field.with(key, value.clone());
            }
            field.into_arc()
        })
        .collect();
    SimpleFieldList::from_fields(fields)
}

/// A small forecast-shaped collection: every combination of
/// `param` in {2t, msl}, `levtype` = sfc, `step` in {0, 6, 12},
/// plus one upper-air field (z / pl / 0).
pub fn forecast_fields() -> SimpleFieldList {
    let mut list = SimpleFieldList::new();
    for param in ["2t", "msl"] {
        for step in [0i64, 6, 12] {
            list.push(
                TestField::new()
                    .with("param", param)
                    .with("levtype", "sfc")
                    .with("step", step)
                    .into_arc(),
            );
        }
    }
    list.push(
        TestField::new()
            .with("param", "z")
            .with("levtype", "pl")
            .with("level", 500i64)
            .with("step", 0i64)
            .into_arc(),
    );
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_core::FieldList;

    #[test]
    fn test_forecast_fields_shape() {
        let list = forecast_fields();
        assert_eq!(list.len(), 7);
        assert_eq!(
            list.field(6).unwrap().attribute("levtype"),
            Some(AttrValue::from("pl"))
        );
    }
}
