//! The indexed field collection: lazy unique-value queries over a wrapped
//! field list.
//!
//! `IndexedFieldList` answers "what unique values does attribute X take"
//! from its [`IndexDb`], scanning the underlying collection at most once per
//! distinct key: a query for several keys collects the cached subset first
//! and fills every missing key in a single forward pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use field_core::{
    extract_attributes, AttrValue, CollectorJoiner, ExtractedValue, FieldError, FieldIter,
    FieldList, FieldResult, OrderSpec, Remapping, Selection, SelectionSpec,
};

use crate::db::{Collected, ComponentEntry, IndexDb, IndexEntry};

/// Result of a unique-values query.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UniqueValues {
    /// Key -> sorted unique values.
    pub index: BTreeMap<String, Vec<AttrValue>>,
    /// Key -> component breakdown (derived keys, when requested).
    pub components: BTreeMap<String, ComponentEntry>,
}

/// A field collection wrapped with a lazy attribute index.
///
/// Selection and reordering delegate to the underlying collection and
/// produce a new wrapped collection: `select` derives a filtered index when
/// the cache already covers the selection keys, `order_by` shares the index
/// unchanged (the cache stores values, not field positions).
pub struct IndexedFieldList {
    list: Arc<dyn FieldList>,
    db: IndexDb,
    remapping: Option<Arc<Remapping>>,
}

impl IndexedFieldList {
    /// Wrap a collection with an empty index.
    pub fn new(list: Arc<dyn FieldList>, remapping: Option<Remapping>) -> Self {
        Self {
            list,
            db: IndexDb::new(),
            remapping: remapping.map(Arc::new),
        }
    }

    /// Wrap a collection and eagerly index the given keys (with component
    /// capture) in one scan.
    pub fn with_keys<S: AsRef<str>>(
        list: Arc<dyn FieldList>,
        keys: &[S],
        remapping: Option<Remapping>,
    ) -> FieldResult<Self> {
        let wrapped = Self::new(list, remapping);
        wrapped.unique_values(keys, true)?;
        Ok(wrapped)
    }

    fn from_parts(list: Box<dyn FieldList>, db: IndexDb, remapping: Option<Arc<Remapping>>) -> Self {
        Self {
            list: Arc::from(list),
            db,
            remapping,
        }
    }

    /// The index store backing this collection.
    pub fn db(&self) -> &IndexDb {
        &self.db
    }

    /// The remapping in effect, if any.
    pub fn remapping(&self) -> Option<&Remapping> {
        self.remapping.as_deref()
    }

    /// Unique values for one or more attribute keys.
    ///
    /// Cached keys are answered from the index store; all missing keys are
    /// filled with exactly one forward pass over the underlying collection.
    /// Values are deduplicated, `None`-filtered and sorted ascending. With
    /// `components` set, derived keys additionally record the component
    /// tuple behind each unique value, positionally aligned.
    pub fn unique_values<S: AsRef<str>>(
        &self,
        names: &[S],
        components: bool,
    ) -> FieldResult<UniqueValues> {
        let keys = normalize_names(names);
        let Collected {
            missing,
            index,
            components: cached_components,
        } = self.db.collect(&keys, components);

        let mut result = UniqueValues {
            index,
            components: cached_components,
        };

        if !missing.is_empty() {
            let entries = self.scan(&missing, components)?;
            for (key, entry) in &entries {
                result.index.insert(key.clone(), entry.values.clone());
                if let Some(component) = &entry.component {
                    result.components.insert(key.clone(), component.clone());
                }
            }
            // Written only after every key built cleanly, so a failed scan
            // leaves previously cached keys untouched.
            self.db.extend(entries);
        }

        Ok(result)
    }

    /// Unique values for a single key.
    pub fn unique(&self, key: &str) -> FieldResult<Vec<AttrValue>> {
        self.db.unique(
            key,
            Some(|key: &str| self.scan(std::slice::from_ref(&key.to_string()), false)),
        )
    }

    /// Component breakdown for a single key: `Some` for derived keys indexed
    /// with component capture, `None` for native keys.
    pub fn component(&self, key: &str) -> FieldResult<Option<ComponentEntry>> {
        match &self.remapping {
            Some(remapping) if remapping.contains(key) => self.db.component(key).map(Some),
            _ => Ok(None),
        }
    }

    /// Filter the collection, returning a new indexed collection.
    ///
    /// Filtering of fields is delegated to the underlying collection (with
    /// the active remapping, so derived keys resolve). When every selection
    /// key is already indexed, the new collection starts from a filtered
    /// copy of this index; otherwise it starts empty and rebuilds lazily.
    pub fn select(&self, spec: &SelectionSpec) -> FieldResult<IndexedFieldList> {
        let selection = Selection::normalize(spec)?;
        let filtered = self.list.select(&selection, self.remapping.as_deref())?;
        let db = self.derive_db(&selection);
        debug!(
            fields = filtered.len(),
            cached_keys = db.len(),
            "selection applied"
        );
        Ok(Self::from_parts(filtered, db, self.remapping.clone()))
    }

    /// Reorder the collection, returning a new indexed collection that
    /// shares this one's index store: reordering changes which position a
    /// field occupies, never the set of attribute values.
    pub fn order_by(&self, order: &OrderSpec) -> FieldResult<IndexedFieldList> {
        let ordered = self.list.order_by(order, self.remapping.as_deref())?;
        Ok(Self::from_parts(
            ordered,
            self.db.clone(),
            self.remapping.clone(),
        ))
    }

    fn derive_db(&self, selection: &Selection) -> IndexDb {
        if self.db.contains_all(selection.keys()) {
            self.db.filter(selection)
        } else {
            IndexDb::with_capacity(
                std::num::NonZeroUsize::new(self.db.capacity()).expect("nonzero"),
            )
        }
    }

    /// One full pass over the underlying collection, building an index entry
    /// for every requested key.
    fn scan(&self, keys: &[String], components: bool) -> FieldResult<BTreeMap<String, IndexEntry>> {
        let remapping = self.remapping.as_deref();
        let joiner = if components {
            Some(CollectorJoiner::new())
        } else {
            None
        };

        debug!(keys = ?keys, fields = self.list.len(), "scanning collection");

        // Per key: value -> component tuple. The BTreeMap gives sort order
        // and deduplication in one structure, with components kept aligned.
        let mut seen: BTreeMap<String, BTreeMap<AttrValue, Option<Vec<String>>>> =
            keys.iter().map(|k| (k.clone(), BTreeMap::new())).collect();

        for field in FieldIter::new(self.list.as_ref()) {
            let extracted = extract_attributes(field.as_ref(), keys, remapping, joiner.as_ref());
            for (key, value) in extracted {
                let slot = seen.get_mut(&key).ok_or_else(|| {
                    FieldError::invariant(format!("extractor returned unrequested key '{}'", key))
                })?;
                match value {
                    Some(ExtractedValue::Plain(v)) => {
                        slot.insert(v, None);
                    }
                    Some(ExtractedValue::Joined { label, components }) => {
                        slot.insert(AttrValue::Str(label), Some(components));
                    }
                    None => {}
                }
            }
        }

        let mut entries = BTreeMap::new();
        for (key, values) in seen {
            let entry = match remapping.filter(|r| components && r.contains(&key)) {
                Some(remapping) => build_derived_entry(&key, values, remapping)?,
                None => IndexEntry::plain(values.into_keys().collect()),
            };
            entries.insert(key, entry);
        }
        Ok(entries)
    }
}

/// Split the scanned `(joined, components)` pairs of a derived key into the
/// aligned value sequence and component breakdown.
fn build_derived_entry(
    key: &str,
    values: BTreeMap<AttrValue, Option<Vec<String>>>,
    remapping: &Remapping,
) -> FieldResult<IndexEntry> {
    let component_keys = remapping
        .components(key)
        .ok_or_else(|| FieldError::invariant(format!("no components for derived key '{}'", key)))?;

    let mut unique = Vec::with_capacity(values.len());
    let mut tuples = Vec::with_capacity(values.len());
    for (value, components) in values {
        let tuple = components.ok_or_else(|| {
            FieldError::invariant(format!(
                "derived key '{}' produced value '{}' without components",
                key, value
            ))
        })?;
        if tuple.len() != component_keys.len() {
            return Err(FieldError::invariant(format!(
                "derived key '{}' captured {} components, template has {}",
                key,
                tuple.len(),
                component_keys.len()
            )));
        }
        unique.push(value);
        tuples.push(tuple);
    }

    IndexEntry::with_component(
        unique,
        ComponentEntry {
            keys: component_keys,
            tuples,
        },
    )
}

/// Normalize requested names into an ordered, de-duplicated key list.
fn normalize_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut keys = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if !keys.iter().any(|k| k == name) {
            keys.push(name.to_string());
        }
    }
    keys
}

impl FieldList for IndexedFieldList {
    fn len(&self) -> usize {
        self.list.len()
    }

    fn field(&self, n: usize) -> Option<Arc<dyn field_core::Field>> {
        self.list.field(n)
    }

    fn select(
        &self,
        selection: &Selection,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>> {
        // The wrapper's own remapping governs; an explicit one is only
        // accepted when the caller passes none.
        let remapping = match remapping {
            Some(r) => Some(r),
            None => self.remapping.as_deref(),
        };
        let filtered = self.list.select(selection, remapping)?;
        let db = self.derive_db(selection);
        Ok(Box::new(Self::from_parts(
            filtered,
            db,
            self.remapping.clone(),
        )))
    }

    fn order_by(
        &self,
        order: &OrderSpec,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>> {
        let remapping = match remapping {
            Some(r) => Some(r),
            None => self.remapping.as_deref(),
        };
        let ordered = self.list.order_by(order, remapping)?;
        Ok(Box::new(Self::from_parts(
            ordered,
            self.db.clone(),
            self.remapping.clone(),
        )))
    }
}

impl std::fmt::Debug for IndexedFieldList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IndexedFieldList(fields={}, {:?})",
            self.list.len(),
            self.db
        )
    }
}
