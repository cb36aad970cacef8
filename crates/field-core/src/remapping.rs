//! Derived attribute remapping.
//!
//! A remapping declares derived attribute keys built from several native
//! attributes via a template, e.g. `"shortName_levtype" = "{param}_{levtype}"`.
//! The remapping is built once at collection construction time and is
//! immutable thereafter.
//!
//! Template syntax: literal text with `{key}` placeholders. A parsed
//! [`Template`] is kept as a strictly interleaved sequence
//! `[literal, key, literal, key, ..., literal]` (literals may be empty),
//! which is exactly the shape the [`CollectorJoiner`] consumes: odd-indexed
//! entries of the expanded sequence are the substituted component values.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FieldError, FieldResult};
use crate::field::Field;
use crate::joiner::CollectorJoiner;
use crate::value::AttrValue;

/// User-facing remapping specification: derived key -> template string.
///
/// Deserializable from YAML/JSON configuration:
///
/// ```yaml
/// shortName_levtype: "{param}_{levtype}"
/// ```
pub type RemappingSpec = BTreeMap<String, String>;

/// One element of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplatePart {
    /// Literal separator text (may be empty).
    Literal(String),
    /// Placeholder naming a native component key.
    Key(String),
}

/// A parsed derived-attribute template.
///
/// Invariant: `parts` strictly alternates `Literal, Key, Literal, ...,
/// Literal` — it starts and ends with a literal and contains at least one
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    /// Parse a template string such as `"{param}_{levtype}"`.
    pub fn parse(s: &str) -> FieldResult<Self> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = s.chars();
        let mut n_keys = 0usize;

        while let Some(c) = chars.next() {
            if c == '{' {
                let mut key = String::new();
                let mut closed = false;
                for k in chars.by_ref() {
                    if k == '}' {
                        closed = true;
                        break;
                    }
                    if k == '{' {
                        return Err(FieldError::invalid_remapping(format!(
                            "nested '{{' in template: {}",
                            s
                        )));
                    }
                    key.push(k);
                }
                if !closed {
                    return Err(FieldError::invalid_remapping(format!(
                        "unterminated placeholder in template: {}",
                        s
                    )));
                }
                if key.is_empty() {
                    return Err(FieldError::invalid_remapping(format!(
                        "empty placeholder in template: {}",
                        s
                    )));
                }
                parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                parts.push(TemplatePart::Key(key));
                n_keys += 1;
            } else if c == '}' {
                return Err(FieldError::invalid_remapping(format!(
                    "unbalanced '}}' in template: {}",
                    s
                )));
            } else {
                literal.push(c);
            }
        }
        parts.push(TemplatePart::Literal(literal));

        if n_keys == 0 {
            return Err(FieldError::invalid_remapping(format!(
                "template has no placeholders: {}",
                s
            )));
        }
        Ok(Self { parts })
    }

    /// Ordered component key names referenced by the template.
    pub fn components(&self) -> Vec<String> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                TemplatePart::Key(k) => Some(k.clone()),
                TemplatePart::Literal(_) => None,
            })
            .collect()
    }

    /// Expand the template into the interleaved literal/value sequence the
    /// joiner consumes. `values` must match `components()` in length and
    /// order.
    pub fn interleave(&self, values: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(self.parts.len());
        let mut vals = values.iter();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(l) => out.push(l.clone()),
                TemplatePart::Key(_) => {
                    out.push(vals.next().cloned().unwrap_or_default());
                }
            }
        }
        out
    }
}

/// Immutable derived-key definitions for one field collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remapping {
    templates: BTreeMap<String, Template>,
}

impl Remapping {
    /// Build a remapping from its declarative specification.
    pub fn from_spec(spec: &RemappingSpec) -> FieldResult<Self> {
        let mut templates = BTreeMap::new();
        for (key, template) in spec {
            templates.insert(key.clone(), Template::parse(template)?);
        }
        debug!(keys = templates.len(), "remapping built");
        Ok(Self { templates })
    }

    /// Build a remapping from a YAML specification document.
    pub fn from_yaml(doc: &str) -> FieldResult<Self> {
        let spec: RemappingSpec = serde_yaml::from_str(doc)?;
        Self::from_spec(&spec)
    }

    /// Whether `key` is a derived key defined by this remapping.
    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// The parsed template for a derived key.
    pub fn template(&self, key: &str) -> Option<&Template> {
        self.templates.get(key)
    }

    /// Ordered component key names for a derived key.
    pub fn components(&self, key: &str) -> Option<Vec<String>> {
        self.templates.get(key).map(Template::components)
    }

    /// Derived key names, in definition order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Whether the remapping defines no derived keys.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// One extracted attribute value: plain, or joined-with-components for a
/// derived key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedValue {
    /// A native attribute value.
    Plain(AttrValue),
    /// A derived value: the joined label plus the raw component values that
    /// produced it, in template order.
    Joined {
        label: String,
        components: Vec<String>,
    },
}

impl ExtractedValue {
    /// The value as seen by matchers and the unique-value cache.
    pub fn as_attr(&self) -> AttrValue {
        match self {
            ExtractedValue::Plain(v) => v.clone(),
            ExtractedValue::Joined { label, .. } => AttrValue::Str(label.clone()),
        }
    }
}

/// Extract the requested attribute keys from one field.
///
/// Native keys read straight from the field's metadata. Derived keys (those
/// the remapping defines) are expanded through their template: component
/// values are stringified (via the joiner's name formatter when one is
/// supplied) and joined. A derived key extracts as `None` when any of its
/// components is missing; with a joiner the result carries the component
/// tuple, without one only the joined label survives.
pub fn extract_attributes(
    field: &dyn Field,
    keys: &[String],
    remapping: Option<&Remapping>,
    joiner: Option<&CollectorJoiner>,
) -> HashMap<String, Option<ExtractedValue>> {
    let mut out = HashMap::with_capacity(keys.len());
    for key in keys {
        let extracted = match remapping.and_then(|r| r.template(key)) {
            Some(template) => expand_derived(field, template, joiner),
            None => field.attribute(key).map(ExtractedValue::Plain),
        };
        out.insert(key.clone(), extracted);
    }
    out
}

fn expand_derived(
    field: &dyn Field,
    template: &Template,
    joiner: Option<&CollectorJoiner>,
) -> Option<ExtractedValue> {
    let mut values = Vec::new();
    for component in template.components() {
        let value = field.attribute(&component)?;
        let text = match joiner {
            Some(j) => j.format_name(&value.to_string()),
            None => value.to_string(),
        };
        values.push(text);
    }
    let parts = template.interleave(&values);
    match joiner {
        Some(j) => {
            let (label, components) = j.join(&parts);
            Some(ExtractedValue::Joined { label, components })
        }
        None => Some(ExtractedValue::Plain(AttrValue::Str(parts.concat()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template_parts() {
        let t = Template::parse("{param}_{levtype}").unwrap();
        assert_eq!(t.components(), vec!["param", "levtype"]);
        assert_eq!(
            t.interleave(&["2t".into(), "sfc".into()]),
            vec!["", "2t", "_", "sfc", ""]
        );
    }

    #[test]
    fn test_parse_template_with_prefix_and_suffix() {
        let t = Template::parse("p{param}h{step}x").unwrap();
        assert_eq!(t.components(), vec!["param", "step"]);
        assert_eq!(
            t.interleave(&["2t".into(), "6".into()]),
            vec!["p", "2t", "h", "6", "x"]
        );
    }

    #[test]
    fn test_parse_template_errors() {
        assert!(matches!(
            Template::parse("no placeholders"),
            Err(FieldError::InvalidRemapping(_))
        ));
        assert!(matches!(
            Template::parse("{unclosed"),
            Err(FieldError::InvalidRemapping(_))
        ));
        assert!(matches!(
            Template::parse("{}"),
            Err(FieldError::InvalidRemapping(_))
        ));
        assert!(matches!(
            Template::parse("a}b"),
            Err(FieldError::InvalidRemapping(_))
        ));
        assert!(matches!(
            Template::parse("{a{b}}"),
            Err(FieldError::InvalidRemapping(_))
        ));
    }

    #[test]
    fn test_remapping_from_yaml() {
        let remapping = Remapping::from_yaml("shortName_levtype: \"{param}_{levtype}\"\n").unwrap();
        assert!(remapping.contains("shortName_levtype"));
        assert_eq!(
            remapping.components("shortName_levtype"),
            Some(vec!["param".to_string(), "levtype".to_string()])
        );
        assert!(!remapping.contains("param"));
    }
}
