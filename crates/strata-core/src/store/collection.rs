// ── Ordered reactive record collection ──
//
// Copy-on-write storage for the store's raw records, with push-based
// change notification via `watch` channels. Mutations swap in a new
// `Arc<Vec<Record>>`; readers holding an older snapshot are unaffected.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;
use tokio::sync::watch;

use crate::model::Record;
use crate::model::value::strict_eq;

/// The raw, insertion-ordered record sequence behind a `DataStore`.
///
/// Mutations only swap storage; subscribers see the new state when the
/// store calls [`broadcast`](Self::broadcast) alongside its `update` event.
pub(crate) struct RecordCollection {
    records: ArcSwap<Vec<Record>>,

    /// Version counter, bumped on every broadcast.
    version: watch::Sender<u64>,

    /// Latest broadcast snapshot, for stream subscribers.
    snapshot: watch::Sender<Arc<Vec<Record>>>,
}

impl RecordCollection {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        let records = Arc::new(records);
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::clone(&records));

        Self {
            records: ArcSwap::new(records),
            version,
            snapshot,
        }
    }

    /// Current raw records (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Record>> {
        self.records.load_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.load().len()
    }

    /// Append a record. Returns its index.
    pub(crate) fn push(&self, record: Record) -> usize {
        let previous = self.records.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(record.clone());
            next
        });
        previous.len()
    }

    /// Remove a record by identity. Returns the index it occupied.
    pub(crate) fn remove(&self, record: &Record) -> Option<usize> {
        self.position(record)?;
        let mut removed = None;
        self.records.rcu(|current| {
            let mut next = Vec::clone(current);
            removed = next.iter().position(|r| Record::ptr_eq(r, record));
            if let Some(index) = removed {
                next.remove(index);
            }
            next
        });
        removed
    }

    /// Remove the record at `index`, if any.
    pub(crate) fn remove_at(&self, index: usize) -> Option<Record> {
        if index >= self.len() {
            return None;
        }
        let mut removed = None;
        self.records.rcu(|current| {
            let mut next = Vec::clone(current);
            removed = (index < next.len()).then(|| next.remove(index));
            next
        });
        removed
    }

    /// Replace every record.
    pub(crate) fn replace(&self, records: Vec<Record>) {
        self.records.store(Arc::new(records));
    }

    /// Index of a record by identity.
    pub(crate) fn position(&self, record: &Record) -> Option<usize> {
        self.records
            .load()
            .iter()
            .position(|r| Record::ptr_eq(r, record))
    }

    /// First record (and its index) whose `field` strictly equals `id`.
    pub(crate) fn find_by(&self, field: &str, id: &Value) -> Option<(usize, Record)> {
        self.records.load().iter().enumerate().find_map(|(index, r)| {
            r.fields()
                .get(field)
                .is_some_and(|value| strict_eq(value, id))
                .then(|| (index, r.clone()))
        })
    }

    /// Publish the current records to stream subscribers.
    pub(crate) fn broadcast(&self) {
        let current = self.snapshot();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = current);
        self.version.send_modify(|v| *v += 1);
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Subscribe to broadcast snapshots via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Record>>> {
        self.snapshot.subscribe()
    }
}
