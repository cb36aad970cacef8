//! Field collections: the `FieldList` trait and a flat in-memory container.
//!
//! A field list is enumerable in a single forward pass and supports
//! attribute-based filtering (`select`) and reordering (`order_by`), both of
//! which produce a new collection and leave the original untouched.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FieldResult;
use crate::field::Field;
use crate::remapping::{extract_attributes, Remapping};
use crate::selection::Selection;
use crate::value::AttrValue;

/// Sort direction for one ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// One ordering criterion: attribute key plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub key: String,
    #[serde(default)]
    pub direction: Direction,
}

/// Ordered list of sort criteria, applied left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub keys: Vec<OrderKey>,
}

impl OrderSpec {
    /// Ascending order over the given keys.
    pub fn by<S: AsRef<str>>(keys: &[S]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|k| OrderKey {
                    key: k.as_ref().to_string(),
                    direction: Direction::Ascending,
                })
                .collect(),
        }
    }

    /// Add a descending key.
    pub fn then_descending(mut self, key: impl Into<String>) -> Self {
        self.keys.push(OrderKey {
            key: key.into(),
            direction: Direction::Descending,
        });
        self
    }

    fn key_names(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.key.clone()).collect()
    }
}

/// An ordered collection of fields.
///
/// Position-based access is assumed cheap; a full forward pass costs one
/// `field` call per position.
pub trait FieldList: Send + Sync {
    /// Number of fields in the collection.
    fn len(&self) -> usize;

    /// The field at position `n`, or `None` past the end.
    fn field(&self, n: usize) -> Option<Arc<dyn Field>>;

    /// Filter the collection, resolving derived selection keys through
    /// `remapping`. Returns a new collection; the original is unchanged.
    fn select(
        &self,
        selection: &Selection,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>>;

    /// Reorder the collection by the given criteria. Returns a new
    /// collection; the original is unchanged.
    fn order_by(
        &self,
        order: &OrderSpec,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>>;

    /// Check if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forward-pass iterator over the fields.
    fn iter(&self) -> FieldIter<'_>
    where
        Self: Sized,
    {
        FieldIter::new(self)
    }
}

/// Forward-pass iterator over a field list.
pub struct FieldIter<'a> {
    list: &'a dyn FieldList,
    pos: usize,
}

impl<'a> FieldIter<'a> {
    pub fn new(list: &'a dyn FieldList) -> Self {
        Self { list, pos: 0 }
    }
}

impl Iterator for FieldIter<'_> {
    type Item = Arc<dyn Field>;

    fn next(&mut self) -> Option<Self::Item> {
        let field = self.list.field(self.pos)?;
        self.pos += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

/// A flat in-memory field container with no indexing.
#[derive(Clone, Default)]
pub struct SimpleFieldList {
    fields: Vec<Arc<dyn Field>>,
}

impl SimpleFieldList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list from existing fields.
    pub fn from_fields(fields: Vec<Arc<dyn Field>>) -> Self {
        Self { fields }
    }

    /// Append a field.
    pub fn push(&mut self, field: Arc<dyn Field>) {
        self.fields.push(field);
    }

    /// Subset by position, in the order the indices are given.
    pub fn mask(&self, indices: &[usize]) -> Self {
        Self {
            fields: indices
                .iter()
                .filter_map(|&i| self.fields.get(i).cloned())
                .collect(),
        }
    }

    /// Concatenate several lists into one.
    pub fn merge(sources: &[SimpleFieldList]) -> Self {
        Self {
            fields: sources
                .iter()
                .flat_map(|s| s.fields.iter().cloned())
                .collect(),
        }
    }
}

impl std::fmt::Debug for SimpleFieldList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimpleFieldList({})", self.fields.len())
    }
}

impl FieldList for SimpleFieldList {
    fn len(&self) -> usize {
        self.fields.len()
    }

    fn field(&self, n: usize) -> Option<Arc<dyn Field>> {
        self.fields.get(n).cloned()
    }

    fn select(
        &self,
        selection: &Selection,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>> {
        let fields = self
            .fields
            .iter()
            .filter(|f| selection.matches(f.as_ref(), remapping))
            .cloned()
            .collect();
        Ok(Box::new(Self { fields }))
    }

    fn order_by(
        &self,
        order: &OrderSpec,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>> {
        let key_names = order.key_names();

        // Extract each field's sort key once, then stable-sort positions.
        let sort_keys: Vec<Vec<Option<AttrValue>>> = self
            .fields
            .iter()
            .map(|f| {
                let extracted = extract_attributes(f.as_ref(), &key_names, remapping, None);
                key_names
                    .iter()
                    .map(|k| {
                        extracted
                            .get(k)
                            .and_then(|v| v.as_ref())
                            .map(|v| v.as_attr())
                    })
                    .collect()
            })
            .collect();

        let mut positions: Vec<usize> = (0..self.fields.len()).collect();
        positions.sort_by(|&a, &b| compare_sort_keys(&sort_keys[a], &sort_keys[b], order));

        Ok(Box::new(self.mask(&positions)))
    }
}

/// Compare two extracted sort-key rows criterion by criterion. Missing
/// values sort before present ones so the ordering stays total.
fn compare_sort_keys(
    a: &[Option<AttrValue>],
    b: &[Option<AttrValue>],
    order: &OrderSpec,
) -> Ordering {
    for (i, key) in order.keys.iter().enumerate() {
        let ord = match (&a[i], &b[i]) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(y),
        };
        let ord = match key.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DataType, FieldValues};
    use crate::selection::{SelectionSpec, SelectionValue};
    use std::collections::HashMap;

    struct AttrField(HashMap<String, AttrValue>);

    impl AttrField {
        fn new(pairs: &[(&str, AttrValue)]) -> Arc<dyn Field> {
            Arc::new(Self(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ))
        }
    }

    impl Field for AttrField {
        fn attribute(&self, key: &str) -> Option<AttrValue> {
            self.0.get(key).cloned()
        }

        fn values(&self, _dtype: DataType) -> FieldValues {
            FieldValues::F64(vec![])
        }

        fn data_format(&self) -> &str {
            "grib"
        }
    }

    fn sample() -> SimpleFieldList {
        SimpleFieldList::from_fields(vec![
            AttrField::new(&[("param", "msl".into()), ("step", 6.into())]),
            AttrField::new(&[("param", "2t".into()), ("step", 0.into())]),
            AttrField::new(&[("param", "2t".into()), ("step", 6.into())]),
        ])
    }

    #[test]
    fn test_select_filters_by_selection() {
        let list = sample();
        let mut spec = SelectionSpec::new();
        spec.insert(
            "param".to_string(),
            SelectionValue::One(AttrValue::from("2t")),
        );
        let selection = Selection::normalize(&spec).unwrap();

        let filtered = list.select(&selection, None).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            filtered.field(0).unwrap().attribute("step"),
            Some(AttrValue::Int(0))
        );
    }

    #[test]
    fn test_order_by_is_stable_over_keys() {
        let list = sample();
        let ordered = list
            .order_by(&OrderSpec::by(&["param", "step"]), None)
            .unwrap();
        let params: Vec<_> = FieldIter::new(ordered.as_ref())
            .map(|f| f.attribute("param").unwrap())
            .collect();
        assert_eq!(
            params,
            vec![
                AttrValue::from("2t"),
                AttrValue::from("2t"),
                AttrValue::from("msl")
            ]
        );
        assert_eq!(
            ordered.field(0).unwrap().attribute("step"),
            Some(AttrValue::Int(0))
        );
    }

    #[test]
    fn test_order_by_descending() {
        let list = sample();
        let order = OrderSpec::default().then_descending("step");
        let ordered = list.order_by(&order, None).unwrap();
        assert_eq!(
            ordered.field(0).unwrap().attribute("step"),
            Some(AttrValue::Int(6))
        );
        assert_eq!(
            ordered.field(2).unwrap().attribute("step"),
            Some(AttrValue::Int(0))
        );
    }

    #[test]
    fn test_mask_and_merge() {
        let list = sample();
        let masked = list.mask(&[2, 0]);
        assert_eq!(masked.len(), 2);
        assert_eq!(
            masked.field(0).unwrap().attribute("param"),
            Some(AttrValue::from("2t"))
        );

        let merged = SimpleFieldList::merge(&[list.clone(), masked]);
        assert_eq!(merged.len(), 5);
    }
}
