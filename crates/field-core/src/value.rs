//! Scalar attribute values with a total ordering.
//!
//! Attribute values extracted from field metadata are heterogeneous: GRIB
//! short names are strings, forecast steps are integers, level pressures may
//! be floats, and validity times are timestamps. [`AttrValue`] models all of
//! them with a total order so unique-value sequences can be sorted and
//! deduplicated deterministically.
//!
//! A missing attribute is `Option::<AttrValue>::None`, never a variant.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar metadata attribute value.
///
/// Ordering is total: values of the same variant compare naturally (floats
/// via `total_cmp`), values of different variants compare by variant rank
/// (`Bool < Int < Float < Str < Time`). This keeps sorts of mixed-type
/// attribute columns deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Boolean flag (e.g. "is ensemble member").
    Bool(bool),
    /// Integer value (forecast step, ensemble number, ...).
    Int(i64),
    /// Floating point value (level pressure, ...).
    Float(f64),
    /// Timestamp value (reference time, valid time).
    Time(DateTime<Utc>),
    /// String value (parameter short name, level type, ...).
    Str(String),
}

impl AttrValue {
    /// Variant rank used for cross-variant ordering.
    fn rank(&self) -> u8 {
        match self {
            AttrValue::Bool(_) => 0,
            AttrValue::Int(_) => 1,
            AttrValue::Float(_) => 2,
            AttrValue::Str(_) => 3,
            AttrValue::Time(_) => 4,
        }
    }

    /// Get the string form if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer form if this is an `Int` value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the float form of a numeric value.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(x) => Some(*x),
            AttrValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttrValue {}

impl Ord for AttrValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a.cmp(b),
            (AttrValue::Int(a), AttrValue::Int(b)) => a.cmp(b),
            (AttrValue::Float(a), AttrValue::Float(b)) => a.total_cmp(b),
            (AttrValue::Str(a), AttrValue::Str(b)) => a.cmp(b),
            (AttrValue::Time(a), AttrValue::Time(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for AttrValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for AttrValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            AttrValue::Bool(b) => b.hash(state),
            AttrValue::Int(n) => n.hash(state),
            AttrValue::Float(x) => x.to_bits().hash(state),
            AttrValue::Str(s) => s.hash(state),
            AttrValue::Time(t) => t.hash(state),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(n) => write!(f, "{}", n),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Str(s) => write!(f, "{}", s),
            AttrValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Int(n)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(t: DateTime<Utc>) -> Self {
        AttrValue::Time(t)
    }
}
