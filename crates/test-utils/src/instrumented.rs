//! A field list that counts how often its fields are accessed.
//!
//! The indexing layer promises "at most one full scan per distinct key";
//! `CountingFieldList` makes that observable: one forward pass over a list
//! of n fields costs exactly n accesses, so `passes()` reports how many full
//! scans a query triggered.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use field_core::{Field, FieldList, FieldResult, OrderSpec, Remapping, Selection, SimpleFieldList};

/// A `SimpleFieldList` wrapper counting `field()` accesses.
pub struct CountingFieldList {
    inner: SimpleFieldList,
    accesses: Arc<AtomicUsize>,
}

impl CountingFieldList {
    pub fn new(inner: SimpleFieldList) -> Self {
        Self {
            inner,
            accesses: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Total `field()` accesses so far (across this list and any collection
    /// derived from it by `select`/`order_by`).
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::Relaxed)
    }

    /// Number of complete forward passes the accesses amount to.
    ///
    /// Only meaningful when the list has been consumed in full passes;
    /// panics on a partial pass so tests fail loudly instead of rounding.
    pub fn passes(&self) -> usize {
        let accesses = self.accesses();
        let len = self.inner.len();
        if len == 0 {
            return 0;
        }
        assert_eq!(
            accesses % len,
            0,
            "{} accesses is not a whole number of passes over {} fields",
            accesses,
            len
        );
        accesses / len
    }

    /// Reset the access counter.
    pub fn reset(&self) {
        self.accesses.store(0, Ordering::Relaxed);
    }

    /// Handle to the shared counter, for asserting on derived collections.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.accesses)
    }

    fn rewrap(&self, inner: SimpleFieldList) -> Self {
        Self {
            inner,
            accesses: Arc::clone(&self.accesses),
        }
    }
}

impl FieldList for CountingFieldList {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn field(&self, n: usize) -> Option<Arc<dyn Field>> {
        let field = self.inner.field(n);
        if field.is_some() {
            self.accesses.fetch_add(1, Ordering::Relaxed);
        }
        field
    }

    fn select(
        &self,
        selection: &Selection,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>> {
        // The filtering pass itself reads every field once.
        let mut kept = SimpleFieldList::new();
        for n in 0..self.len() {
            if let Some(field) = self.field(n) {
                if selection.matches(field.as_ref(), remapping) {
                    kept.push(field);
                }
            }
        }
        Ok(Box::new(self.rewrap(kept)))
    }

    fn order_by(
        &self,
        order: &OrderSpec,
        remapping: Option<&Remapping>,
    ) -> FieldResult<Box<dyn FieldList>> {
        let ordered = self.inner.order_by(order, remapping)?;
        let mut fields = SimpleFieldList::new();
        for n in 0..ordered.len() {
            if let Some(field) = ordered.field(n) {
                fields.push(field);
            }
        }
        Ok(Box::new(self.rewrap(fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::forecast_fields;
    use field_core::FieldIter;

    #[test]
    fn test_counts_full_passes() {
        let list = CountingFieldList::new(forecast_fields());
        assert_eq!(list.passes(), 0);

        for _ in FieldIter::new(&list) {}
        assert_eq!(list.passes(), 1);

        for _ in FieldIter::new(&list) {}
        assert_eq!(list.passes(), 2);
    }

    #[test]
    fn test_reset() {
        let list = CountingFieldList::new(forecast_fields());
        for _ in FieldIter::new(&list) {}
        list.reset();
        assert_eq!(list.accesses(), 0);
    }
}
