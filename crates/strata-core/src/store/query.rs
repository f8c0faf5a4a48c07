// ── Filtered, sorted view ──
//
// The view is never cached: every read recomputes raw → filter → sort from
// the current collection and the active descriptor sets.

use std::sync::Arc;

use tracing::debug;

use super::DataStore;
use crate::events::{EventKind, EventPayload};
use crate::model::query::compare_records;
use crate::model::{Filter, Record, Sorter};

/// Fold `incoming` into `active`, keeping at most one filter per property.
/// A filter on an already-filtered property takes that filter's place.
pub(super) fn merge_filters(
    mut active: Vec<Filter>,
    incoming: impl IntoIterator<Item = Filter>,
) -> Vec<Filter> {
    for filter in incoming {
        match active.iter_mut().find(|f| f.property == filter.property) {
            Some(slot) => *slot = filter,
            None => active.push(filter),
        }
    }
    active
}

impl DataStore {
    // ── Filters ──────────────────────────────────────────────────────

    /// Apply filters. With `replace`, the incoming set becomes the active
    /// set; otherwise each incoming filter overrides the active filter on
    /// the same property or is appended. Publishes `filter`.
    pub fn filter(&self, filters: impl IntoIterator<Item = Filter>, replace: bool) {
        let base = if replace {
            Vec::new()
        } else {
            Vec::clone(&self.inner.filters.load())
        };
        let next = merge_filters(base, filters);
        debug!(count = next.len(), replace, "filters applied");
        self.inner.filters.store(Arc::new(next.clone()));
        self.publish(EventKind::Filter, &EventPayload::Filter { filters: next });
    }

    /// Drop every active filter. Publishes `filter`.
    pub fn clear_filters(&self) {
        self.inner.filters.store(Arc::new(Vec::new()));
        debug!("filters cleared");
        self.publish(
            EventKind::Filter,
            &EventPayload::Filter {
                filters: Vec::new(),
            },
        );
    }

    pub fn filters(&self) -> Vec<Filter> {
        Vec::clone(&self.inner.filters.load())
    }

    // ── Sorters ──────────────────────────────────────────────────────

    /// Replace the sorter list. Publishes `sort`.
    pub fn sort(&self, sorters: impl IntoIterator<Item = Sorter>) {
        let next: Vec<Sorter> = sorters.into_iter().collect();
        debug!(count = next.len(), "sorters applied");
        self.inner.sorters.store(Arc::new(next.clone()));
        self.publish(EventKind::Sort, &EventPayload::Sort { sorters: next });
    }

    /// Drop every sorter. Publishes `sort`.
    pub fn clear_sorters(&self) {
        self.inner.sorters.store(Arc::new(Vec::new()));
        debug!("sorters cleared");
        self.publish(
            EventKind::Sort,
            &EventPayload::Sort {
                sorters: Vec::new(),
            },
        );
    }

    pub fn sorters(&self) -> Vec<Sorter> {
        Vec::clone(&self.inner.sorters.load())
    }

    // ── View ─────────────────────────────────────────────────────────

    /// The current view: raw records passing every filter, in sorter order.
    /// Fully tied records keep collection order.
    pub fn get_records(&self) -> Vec<Record> {
        let raw = self.inner.collection.snapshot();
        let filters = self.inner.filters.load();
        let sorters = self.inner.sorters.load();

        let mut view: Vec<_> = raw
            .iter()
            .map(|record| (record.fields(), record))
            .filter(|(fields, _)| filters.iter().all(|f| f.matches(fields)))
            .collect();

        if !sorters.is_empty() {
            view.sort_by(|(a, _), (b, _)| compare_records(&sorters, a, b));
        }

        view.into_iter().map(|(_, record)| record.clone()).collect()
    }

    pub fn get_count(&self) -> usize {
        self.get_records().len()
    }

    /// Record at `index` in the view.
    pub fn get_at(&self, index: usize) -> Option<Record> {
        self.get_records().into_iter().nth(index)
    }

    /// Position of `record` (by identity) in the view.
    pub fn index_of(&self, record: &Record) -> Option<usize> {
        self.get_records()
            .iter()
            .position(|r| Record::ptr_eq(r, record))
    }
}
