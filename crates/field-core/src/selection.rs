//! Selection predicates over field attributes.
//!
//! A [`Selection`] is a normalized set of `key -> matcher` pairs combined
//! with AND semantics: a field matches only if every key's matcher accepts
//! the field's extracted value for that key. Matchers are opaque predicates
//! over a single value; a value list means "any of these" for that key, but
//! there is no OR across keys.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};
use crate::field::Field;
use crate::remapping::{extract_attributes, Remapping};
use crate::value::AttrValue;

/// User-facing selection request: key -> one value or a list of acceptable
/// values.
pub type SelectionSpec = BTreeMap<String, SelectionValue>;

/// One value or several acceptable values for a selection key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectionValue {
    One(AttrValue),
    Many(Vec<AttrValue>),
}

/// An opaque predicate over a single attribute value.
#[derive(Clone)]
pub enum Matcher {
    /// Accept exactly this value.
    Eq(AttrValue),
    /// Accept any of these values.
    In(Vec<AttrValue>),
    /// Accept values the predicate approves.
    Predicate(Arc<dyn Fn(&AttrValue) -> bool + Send + Sync>),
}

impl Matcher {
    /// Evaluate the matcher against one extracted value.
    pub fn matches(&self, value: &AttrValue) -> bool {
        match self {
            Matcher::Eq(v) => v == value,
            Matcher::In(vs) => vs.contains(value),
            Matcher::Predicate(f) => f(value),
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Eq(v) => f.debug_tuple("Eq").field(v).finish(),
            Matcher::In(vs) => f.debug_tuple("In").field(vs).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A normalized set of per-key matchers, combined with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    matchers: BTreeMap<String, Matcher>,
}

impl Selection {
    /// Normalize a user-facing selection request.
    ///
    /// Single values become [`Matcher::Eq`], value lists become
    /// [`Matcher::In`]. An empty value list is rejected: it would match
    /// nothing and almost always indicates a malformed request.
    pub fn normalize(spec: &SelectionSpec) -> FieldResult<Self> {
        let mut matchers = BTreeMap::new();
        for (key, value) in spec {
            let matcher = match value {
                SelectionValue::One(v) => Matcher::Eq(v.clone()),
                SelectionValue::Many(vs) => {
                    if vs.is_empty() {
                        return Err(FieldError::invalid_selection(format!(
                            "empty value list for key '{}'",
                            key
                        )));
                    }
                    Matcher::In(vs.clone())
                }
            };
            matchers.insert(key.clone(), matcher);
        }
        Ok(Self { matchers })
    }

    /// Build a selection from explicit matchers.
    pub fn from_matchers(matchers: BTreeMap<String, Matcher>) -> Self {
        Self { matchers }
    }

    /// Whether a single field satisfies every matcher.
    ///
    /// Each key's value is extracted (resolving derived keys through the
    /// remapping) and tested against the key's matcher. A missing value
    /// never matches.
    pub fn matches(&self, field: &dyn Field, remapping: Option<&Remapping>) -> bool {
        if self.matchers.is_empty() {
            return true;
        }
        let keys: Vec<String> = self.matchers.keys().cloned().collect();
        let extracted = extract_attributes(field, &keys, remapping, None);
        self.matchers.iter().all(|(key, matcher)| {
            match extracted.get(key).and_then(|v| v.as_ref()) {
                Some(v) => matcher.matches(&v.as_attr()),
                None => false,
            }
        })
    }

    /// The matcher for one key, if the selection constrains it.
    pub fn matcher(&self, key: &str) -> Option<&Matcher> {
        self.matchers.get(key)
    }

    /// Whether the selection constrains `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.matchers.contains_key(key)
    }

    /// Keys constrained by this selection.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.matchers.keys().map(String::as_str)
    }

    /// Whether the selection is unconstrained.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pairs: &[(&str, SelectionValue)]) -> SelectionSpec {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_normalize_rejects_empty_list() {
        let spec = spec(&[("param", SelectionValue::Many(vec![]))]);
        assert!(matches!(
            Selection::normalize(&spec),
            Err(FieldError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_matcher_eq_and_in() {
        let eq = Matcher::Eq(AttrValue::from("sfc"));
        assert!(eq.matches(&AttrValue::from("sfc")));
        assert!(!eq.matches(&AttrValue::from("pl")));

        let any = Matcher::In(vec![AttrValue::from("2t"), AttrValue::from("msl")]);
        assert!(any.matches(&AttrValue::from("msl")));
        assert!(!any.matches(&AttrValue::from("z")));
    }

    #[test]
    fn test_matcher_predicate() {
        let even = Matcher::Predicate(Arc::new(|v: &AttrValue| {
            v.as_int().map(|n| n % 2 == 0).unwrap_or(false)
        }));
        assert!(even.matches(&AttrValue::Int(6)));
        assert!(!even.matches(&AttrValue::Int(3)));
        assert!(!even.matches(&AttrValue::from("6")));
    }

    #[test]
    fn test_spec_deserializes_one_or_many() {
        let spec: SelectionSpec =
            serde_json::from_str(r#"{"levtype": "sfc", "param": ["2t", "msl"]}"#).unwrap();
        let selection = Selection::normalize(&spec).unwrap();
        assert!(matches!(
            selection.matcher("levtype"),
            Some(Matcher::Eq(_))
        ));
        assert!(matches!(selection.matcher("param"), Some(Matcher::In(_))));
    }
}
