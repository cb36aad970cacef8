//! Component joiner for derived attribute extraction.
//!
//! When a scan extracts a derived attribute, the joiner turns the template's
//! interleaved literal/value sequence into the user-facing joined label and
//! captures the tuple of raw component values that produced it. The label
//! feeds the unique-value cache, the tuple feeds the component cache at the
//! same position.

use std::sync::Arc;

use crate::remapping::ExtractedValue;

/// Formatting function applied to each component value before joining.
pub type NameFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Joins template parts into a `(label, components)` pair.
#[derive(Clone, Default)]
pub struct CollectorJoiner {
    formatter: Option<NameFormatter>,
}

impl CollectorJoiner {
    /// A joiner that formats component values with `Display` as-is.
    pub fn new() -> Self {
        Self::default()
    }

    /// A joiner applying a caller-supplied formatting function to each
    /// component value.
    pub fn with_formatter(formatter: NameFormatter) -> Self {
        Self {
            formatter: Some(formatter),
        }
    }

    /// Format one component value for display.
    pub fn format_name(&self, raw: &str) -> String {
        match &self.formatter {
            Some(f) => f(raw),
            None => raw.to_string(),
        }
    }

    /// Join an interleaved `[literal, value, literal, value, ..., literal]`
    /// sequence.
    ///
    /// Returns the concatenation of all parts in order, plus the tuple of
    /// only the substituted component values (odd-indexed parts), with the
    /// literal separators discarded.
    pub fn join(&self, parts: &[String]) -> (String, Vec<String>) {
        let label = parts.concat();
        let components = parts
            .iter()
            .enumerate()
            .filter_map(|(i, p)| if i % 2 == 1 { Some(p.clone()) } else { None })
            .collect();
        (label, components)
    }

    /// Apply `f` to the label half of an extracted value, leaving captured
    /// components untouched; plain values are patched directly.
    pub fn patch<F>(f: F, value: ExtractedValue) -> ExtractedValue
    where
        F: Fn(String) -> String,
    {
        match value {
            ExtractedValue::Joined { label, components } => ExtractedValue::Joined {
                label: f(label),
                components,
            },
            ExtractedValue::Plain(v) => ExtractedValue::Plain(crate::value::AttrValue::Str(f(v
                .to_string()))),
        }
    }
}

impl std::fmt::Debug for CollectorJoiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorJoiner")
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttrValue;

    #[test]
    fn test_join_keeps_odd_indexed_components() {
        let joiner = CollectorJoiner::new();
        let parts: Vec<String> = ["", "2t", "_", "sfc", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (label, components) = joiner.join(&parts);
        assert_eq!(label, "2t_sfc");
        assert_eq!(components, vec!["2t", "sfc"]);
    }

    #[test]
    fn test_format_name_with_formatter() {
        let joiner =
            CollectorJoiner::with_formatter(Arc::new(|s: &str| s.to_uppercase()));
        assert_eq!(joiner.format_name("sfc"), "SFC");
        assert_eq!(CollectorJoiner::new().format_name("sfc"), "sfc");
    }

    #[test]
    fn test_patch_only_touches_label() {
        let patched = CollectorJoiner::patch(
            |s| format!("[{}]", s),
            ExtractedValue::Joined {
                label: "2t_sfc".into(),
                components: vec!["2t".into(), "sfc".into()],
            },
        );
        assert_eq!(
            patched,
            ExtractedValue::Joined {
                label: "[2t_sfc]".into(),
                components: vec!["2t".into(), "sfc".into()],
            }
        );

        let patched = CollectorJoiner::patch(
            |s| format!("[{}]", s),
            ExtractedValue::Plain(AttrValue::from("2t")),
        );
        assert_eq!(patched, ExtractedValue::Plain(AttrValue::from("[2t]")));
    }
}
