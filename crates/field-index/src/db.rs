//! The index store: per-key caches of unique attribute values and their
//! component breakdowns.
//!
//! Each cached key holds one [`IndexEntry`]: the sorted, deduplicated unique
//! values and, for derived keys, the aligned component breakdown. Keeping
//! both halves in a single entry makes the alignment invariant structural:
//! eviction or filtering can never leave a component breakdown behind
//! without its value sequence.
//!
//! The store is capacity-bounded: it caches at most a fixed number of
//! distinct keys and evicts least-recently-used entries beyond that, with
//! hit/miss/eviction statistics in the style of the other caches in this
//! workspace.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use lru::LruCache;
use tracing::{debug, trace};

use field_core::{AttrValue, FieldError, FieldResult, Selection};

/// Default cap on distinct attribute keys cached per store.
pub const DEFAULT_KEY_CAPACITY: usize = 512;

/// Component breakdown for one derived key.
///
/// `tuples[i]` holds the raw component values whose join produced the i-th
/// unique value of the owning entry, in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEntry {
    /// Ordered component key names from the remapping template.
    pub keys: Vec<String>,
    /// One component tuple per unique value, positionally aligned.
    pub tuples: Vec<Vec<String>>,
}

/// Cached index data for one attribute key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Unique values: deduplicated, `None`-filtered, sorted ascending.
    pub values: Vec<AttrValue>,
    /// Component breakdown, present only for derived keys indexed with
    /// component capture.
    pub component: Option<ComponentEntry>,
}

impl IndexEntry {
    /// An entry with no component breakdown.
    pub fn plain(values: Vec<AttrValue>) -> Self {
        Self {
            values,
            component: None,
        }
    }

    /// An entry with an aligned component breakdown.
    ///
    /// Fails with `InvariantViolation` when the breakdown is not positionally
    /// aligned with the values.
    pub fn with_component(values: Vec<AttrValue>, component: ComponentEntry) -> FieldResult<Self> {
        if component.tuples.len() != values.len() {
            return Err(FieldError::invariant(format!(
                "component breakdown has {} tuples for {} unique values",
                component.tuples.len(),
                values.len()
            )));
        }
        Ok(Self {
            values,
            component: Some(component),
        })
    }
}

/// Counters for index store activity.
#[derive(Debug, Default, Clone)]
pub struct IndexStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl IndexStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Result of partitioning a key request against the cache.
#[derive(Debug, Default)]
pub struct Collected {
    /// Keys still requiring a scan, in request order.
    pub missing: Vec<String>,
    /// Cached unique values.
    pub index: BTreeMap<String, Vec<AttrValue>>,
    /// Cached component breakdowns (when requested and present).
    pub components: BTreeMap<String, ComponentEntry>,
}

struct Inner {
    entries: LruCache<String, IndexEntry>,
    stats: IndexStats,
}

/// Capacity-bounded cache of unique attribute values per key.
///
/// Cloning is cheap and shares the underlying cache; this is what lets a
/// reordered collection reuse its parent's index. [`IndexDb::filter`] is the
/// pure transform that derives an independent, consistent store for a
/// filtered collection.
#[derive(Clone)]
pub struct IndexDb {
    inner: Arc<RwLock<Inner>>,
}

impl IndexDb {
    /// Create an empty store with the default key capacity.
    pub fn new() -> Self {
        Self::with_capacity(NonZeroUsize::new(DEFAULT_KEY_CAPACITY).expect("nonzero"))
    }

    /// Create an empty store capped at `capacity` distinct keys.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                entries: LruCache::new(capacity),
                stats: IndexStats::default(),
            })),
        }
    }

    /// Create a store seeded with existing entries.
    pub fn from_entries(entries: BTreeMap<String, IndexEntry>) -> Self {
        let capacity = entries.len().max(DEFAULT_KEY_CAPACITY);
        let db = Self::with_capacity(NonZeroUsize::new(capacity).expect("nonzero"));
        db.extend(entries);
        db
    }

    /// Cached unique values for `key`.
    ///
    /// On a miss, `fill` is invoked; it may compute entries for several keys
    /// in one pass and returns all of them, which are stored before the
    /// requested key's values are returned. Fails with `NotFound` when the
    /// key is uncached and no fill path exists (or the fill did not produce
    /// the key).
    pub fn unique<F>(&self, key: &str, fill: Option<F>) -> FieldResult<Vec<AttrValue>>
    where
        F: FnOnce(&str) -> FieldResult<BTreeMap<String, IndexEntry>>,
    {
        {
            let mut inner = self.inner.write().expect("index lock poisoned");
            if let Some(entry) = inner.entries.get(key) {
                let values = entry.values.clone();
                inner.stats.hits += 1;
                trace!(key, n = values.len(), "index hit");
                return Ok(values);
            }
            inner.stats.misses += 1;
        }

        let fill = fill.ok_or_else(|| FieldError::not_found(key))?;
        debug!(key, "index miss, filling");
        let entries = fill(key)?;
        self.extend(entries);

        let inner = self.inner.read().expect("index lock poisoned");
        inner
            .entries
            .peek(key)
            .map(|e| e.values.clone())
            .ok_or_else(|| FieldError::not_found(key))
    }

    /// Cached component breakdown for `key`. Derived keys only; native keys
    /// never have an entry.
    pub fn component(&self, key: &str) -> FieldResult<ComponentEntry> {
        let inner = self.inner.read().expect("index lock poisoned");
        inner
            .entries
            .peek(key)
            .and_then(|e| e.component.clone())
            .ok_or_else(|| FieldError::not_found(key))
    }

    /// Partition `keys` into the cached subset (with values, and component
    /// breakdowns when `components` is set and present) and the subset still
    /// requiring a scan. Does not promote LRU order.
    pub fn collect(&self, keys: &[String], components: bool) -> Collected {
        let inner = self.inner.read().expect("index lock poisoned");
        let mut collected = Collected::default();
        for key in keys {
            match inner.entries.peek(key) {
                Some(entry) => {
                    collected.index.insert(key.clone(), entry.values.clone());
                    if components {
                        if let Some(component) = &entry.component {
                            collected.components.insert(key.clone(), component.clone());
                        }
                    }
                }
                None => collected.missing.push(key.clone()),
            }
        }
        collected
    }

    /// Insert one entry, evicting the least-recently-used key when the cap
    /// is exceeded.
    pub fn insert(&self, key: String, entry: IndexEntry) {
        let mut inner = self.inner.write().expect("index lock poisoned");
        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry) {
            if evicted != key {
                inner.stats.evictions += 1;
                debug!(key = %evicted, "index entry evicted");
            }
        }
        inner.stats.entries = inner.entries.len();
    }

    /// Insert several entries at once.
    pub fn extend(&self, entries: BTreeMap<String, IndexEntry>) {
        for (key, entry) in entries {
            self.insert(key, entry);
        }
    }

    /// Derive a new, independent store for a filtered collection.
    ///
    /// For each cached key the selection constrains, the unique values are
    /// reduced to those the key's matcher accepts, and any component
    /// breakdown is reduced by the same positional subset. Keys without an
    /// active matcher are copied through unchanged. The original store is
    /// never mutated.
    pub fn filter(&self, selection: &Selection) -> IndexDb {
        let inner = self.inner.read().expect("index lock poisoned");
        let capacity = inner.entries.cap();

        let mut filtered = BTreeMap::new();
        for (key, entry) in inner.entries.iter() {
            let new_entry = match selection.matcher(key) {
                Some(matcher) => {
                    let kept: Vec<usize> = entry
                        .values
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| matcher.matches(v))
                        .map(|(i, _)| i)
                        .collect();
                    IndexEntry {
                        values: kept.iter().map(|&i| entry.values[i].clone()).collect(),
                        component: entry.component.as_ref().map(|c| ComponentEntry {
                            keys: c.keys.clone(),
                            tuples: kept.iter().map(|&i| c.tuples[i].clone()).collect(),
                        }),
                    }
                }
                None => entry.clone(),
            };
            filtered.insert(key.clone(), new_entry);
        }
        drop(inner);

        let db = IndexDb::with_capacity(capacity);
        db.extend(filtered);
        db
    }

    /// Whether every key is currently cached. Does not promote LRU order.
    pub fn contains_all<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let inner = self.inner.read().expect("index lock poisoned");
        keys.into_iter().all(|k| inner.entries.contains(k))
    }

    /// Whether `key` is currently cached.
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .read()
            .expect("index lock poisoned")
            .entries
            .contains(key)
    }

    /// Drop the entry for `key`. Returns whether one was cached.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.write().expect("index lock poisoned");
        let removed = inner.entries.pop(key).is_some();
        inner.stats.entries = inner.entries.len();
        removed
    }

    /// Drop all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("index lock poisoned");
        inner.entries.clear();
        inner.stats.entries = 0;
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("index lock poisoned")
            .entries
            .len()
    }

    /// Check if no keys are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cap on distinct cached keys.
    pub fn capacity(&self) -> usize {
        self.inner
            .read()
            .expect("index lock poisoned")
            .entries
            .cap()
            .get()
    }

    /// Current statistics.
    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read().expect("index lock poisoned");
        let mut stats = inner.stats.clone();
        stats.entries = inner.entries.len();
        stats
    }
}

impl Default for IndexDb {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IndexDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        write!(
            f,
            "IndexDb(keys={}, hits={}, misses={})",
            stats.entries, stats.hits, stats.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_core::{Selection, SelectionSpec, SelectionValue};

    fn entry(values: &[&str]) -> IndexEntry {
        IndexEntry::plain(values.iter().map(|v| AttrValue::from(*v)).collect())
    }

    /// No fill path: the lookup must answer from cache or fail.
    fn no_fill() -> Option<fn(&str) -> FieldResult<BTreeMap<String, IndexEntry>>> {
        None
    }

    fn derived_entry() -> IndexEntry {
        IndexEntry::with_component(
            vec![AttrValue::from("2t_sfc"), AttrValue::from("msl_sfc")],
            ComponentEntry {
                keys: vec!["param".into(), "levtype".into()],
                tuples: vec![
                    vec!["2t".into(), "sfc".into()],
                    vec!["msl".into(), "sfc".into()],
                ],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_unique_without_fill_is_not_found() {
        let db = IndexDb::new();
        let result = db.unique("param", no_fill());
        assert!(matches!(result, Err(FieldError::NotFound(_))));
    }

    #[test]
    fn test_unique_fill_stores_all_returned_keys() {
        let db = IndexDb::new();
        let values = db
            .unique(
                "param",
                Some(|_: &str| {
                    let mut entries = BTreeMap::new();
                    entries.insert("param".to_string(), entry(&["2t", "msl"]));
                    entries.insert("levtype".to_string(), entry(&["sfc"]));
                    Ok(entries)
                }),
            )
            .unwrap();
        assert_eq!(values, vec![AttrValue::from("2t"), AttrValue::from("msl")]);

        // The extra key filled in the same pass is now cached too.
        assert!(db.contains("levtype"));
        assert_eq!(db.stats().misses, 1);
    }

    #[test]
    fn test_collect_partitions_cached_and_missing() {
        let db = IndexDb::new();
        db.insert("param".to_string(), entry(&["2t", "msl"]));

        let keys = vec!["param".to_string(), "step".to_string()];
        let collected = db.collect(&keys, false);
        assert_eq!(collected.missing, vec!["step".to_string()]);
        assert_eq!(
            collected.index.get("param").unwrap(),
            &vec![AttrValue::from("2t"), AttrValue::from("msl")]
        );
    }

    #[test]
    fn test_component_only_for_derived_entries() {
        let db = IndexDb::new();
        db.insert("param".to_string(), entry(&["2t"]));
        db.insert("shortName_levtype".to_string(), derived_entry());

        assert!(matches!(
            db.component("param"),
            Err(FieldError::NotFound(_))
        ));
        let component = db.component("shortName_levtype").unwrap();
        assert_eq!(component.keys, vec!["param", "levtype"]);
        assert_eq!(component.tuples.len(), 2);
    }

    #[test]
    fn test_misaligned_component_rejected() {
        let result = IndexEntry::with_component(
            vec![AttrValue::from("2t_sfc")],
            ComponentEntry {
                keys: vec!["param".into(), "levtype".into()],
                tuples: vec![],
            },
        );
        assert!(matches!(result, Err(FieldError::InvariantViolation(_))));
    }

    #[test]
    fn test_filter_reduces_values_and_components_together() {
        let db = IndexDb::new();
        db.insert("shortName_levtype".to_string(), derived_entry());
        db.insert("step".to_string(), {
            IndexEntry::plain(vec![AttrValue::Int(0), AttrValue::Int(6)])
        });

        let mut spec = SelectionSpec::new();
        spec.insert(
            "shortName_levtype".to_string(),
            SelectionValue::One(AttrValue::from("msl_sfc")),
        );
        let selection = Selection::normalize(&spec).unwrap();

        let filtered = db.filter(&selection);

        // Constrained key: values and component tuples reduced together.
        let values = filtered.unique("shortName_levtype", no_fill()).unwrap();
        assert_eq!(values, vec![AttrValue::from("msl_sfc")]);
        let component = filtered.component("shortName_levtype").unwrap();
        assert_eq!(component.tuples, vec![vec!["msl".to_string(), "sfc".to_string()]]);

        // Unconstrained key copied through unchanged.
        let steps = filtered.unique("step", no_fill()).unwrap();
        assert_eq!(steps, vec![AttrValue::Int(0), AttrValue::Int(6)]);

        // Original untouched.
        let original = db.component("shortName_levtype").unwrap();
        assert_eq!(original.tuples.len(), 2);
    }

    #[test]
    fn test_capacity_eviction_drops_whole_entry() {
        let db = IndexDb::with_capacity(NonZeroUsize::new(2).unwrap());
        db.insert("a".to_string(), derived_entry());
        db.insert("b".to_string(), entry(&["x"]));
        db.insert("c".to_string(), entry(&["y"]));

        assert!(!db.contains("a"));
        assert!(matches!(db.component("a"), Err(FieldError::NotFound(_))));
        assert_eq!(db.len(), 2);
        assert_eq!(db.stats().evictions, 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let db = IndexDb::new();
        db.insert("param".to_string(), entry(&["2t"]));
        assert!(db.invalidate("param"));
        assert!(!db.invalidate("param"));

        db.insert("param".to_string(), entry(&["2t"]));
        db.clear();
        assert!(db.is_empty());
    }

    #[test]
    fn test_clone_shares_cache() {
        let db = IndexDb::new();
        let shared = db.clone();
        db.insert("param".to_string(), entry(&["2t"]));
        assert!(shared.contains("param"));
    }
}
