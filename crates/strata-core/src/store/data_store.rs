// ── Central reactive record store ──
//
// Owns the raw collection, the active filter and sorter sets, an optional
// proxy, and the event publisher. Every collection mutation publishes one
// semantic event followed by exactly one `update`.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::collection::RecordCollection;
use super::tree::TreeView;
use crate::config::{DuplicateIds, StoreConfig};
use crate::error::CoreError;
use crate::events::{EventKind, EventPayload, EventPublisher, Listener};
use crate::model::{Fields, Filter, Record, Sorter};
use crate::proxy::DataProxy;
use crate::stream::RecordStream;

/// Reactive in-memory record store.
///
/// Cheaply cloneable via `Arc<StoreInner>`; clones share state. Listeners
/// that need to call back into the store capture a clone.
#[derive(Clone)]
pub struct DataStore {
    pub(super) inner: Arc<StoreInner>,
}

pub(super) struct StoreInner {
    pub(super) config: StoreConfig,
    pub(super) collection: RecordCollection,
    pub(super) filters: ArcSwap<Vec<Filter>>,
    pub(super) sorters: ArcSwap<Vec<Sorter>>,
    proxy: Option<Arc<dyn DataProxy>>,
    events: EventPublisher,
    last_loaded: watch::Sender<Option<DateTime<Utc>>>,
}

// ── Builder ──────────────────────────────────────────────────────────

/// Construction options for a [`DataStore`].
#[derive(Default)]
pub struct DataStoreBuilder {
    config: StoreConfig,
    records: Vec<Record>,
    proxy: Option<Arc<dyn DataProxy>>,
    filters: Vec<Filter>,
    sorters: Vec<Sorter>,
}

impl DataStoreBuilder {
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Initial collection.
    #[must_use]
    pub fn records(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.records = records.into_iter().collect();
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: impl DataProxy + 'static) -> Self {
        self.proxy = Some(Arc::new(proxy));
        self
    }

    /// Initial filters, applied with the same per-property rule as `filter()`.
    #[must_use]
    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters = super::query::merge_filters(Vec::new(), filters);
        self
    }

    #[must_use]
    pub fn sorters(mut self, sorters: impl IntoIterator<Item = Sorter>) -> Self {
        self.sorters = sorters.into_iter().collect();
        self
    }

    pub fn build(self) -> DataStore {
        let (last_loaded, _) = watch::channel(None);
        DataStore {
            inner: Arc::new(StoreInner {
                config: self.config,
                collection: RecordCollection::new(self.records),
                filters: ArcSwap::from_pointee(self.filters),
                sorters: ArcSwap::from_pointee(self.sorters),
                proxy: self.proxy,
                events: EventPublisher::new(),
                last_loaded,
            }),
        }
    }
}

impl DataStore {
    /// An empty store with the given configuration and no proxy.
    pub fn new(config: StoreConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> DataStoreBuilder {
        DataStoreBuilder::default()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    // ── Events ───────────────────────────────────────────────────────

    /// The publisher this store emits on.
    pub fn events(&self) -> &EventPublisher {
        &self.inner.events
    }

    pub fn subscribe(&self, event: impl AsRef<str>, listener: Listener) -> bool {
        self.inner.events.subscribe(event, listener)
    }

    /// One-shot subscription; returns the wrapper handle for `unsubscribe`.
    pub fn subscribe_once(&self, event: impl AsRef<str>, listener: Listener) -> Listener {
        self.inner.events.subscribe_once(event, listener)
    }

    pub fn unsubscribe(&self, event: impl AsRef<str>, listener: &Listener) -> bool {
        self.inner.events.unsubscribe(event, listener)
    }

    pub(super) fn publish(&self, kind: EventKind, payload: &EventPayload) -> bool {
        self.inner.events.publish(kind, payload)
    }

    /// Broadcast the collection to streams, then publish `update`.
    pub(super) fn notify_update(&self) {
        self.inner.collection.broadcast();
        self.publish(EventKind::Update, &EventPayload::Update);
    }

    // ── CRUD ─────────────────────────────────────────────────────────

    /// Append a record. Publishes `add` then `update`, and returns the
    /// record's index in the raw collection.
    pub fn add(&self, record: impl Into<Record>) -> Result<usize, CoreError> {
        let record = record.into();
        let id_field = &self.inner.config.id_field;
        if self.inner.config.duplicate_ids == DuplicateIds::Reject {
            if let Some(id) = record.get(id_field).filter(|id| !id.is_null()) {
                if self.inner.collection.find_by(id_field, &id).is_some() {
                    return Err(CoreError::DuplicateId { id: id.to_string() });
                }
            }
        }

        let index = self.inner.collection.push(record.clone());
        debug!(index, "record added");
        self.publish(EventKind::Add, &EventPayload::Add { record, index });
        self.notify_update();
        Ok(index)
    }

    /// Remove a record by identity. Silent no-op if it is not stored.
    pub fn remove(&self, record: &Record) -> Option<usize> {
        let index = self.inner.collection.remove(record)?;
        debug!(index, "record removed");
        self.publish(
            EventKind::Remove,
            &EventPayload::Remove {
                record: record.clone(),
                index,
            },
        );
        self.notify_update();
        Some(index)
    }

    /// Remove the record at a raw-collection index. Silent no-op if out of range.
    pub fn remove_at(&self, index: usize) -> Option<Record> {
        let record = self.inner.collection.remove_at(index)?;
        debug!(index, "record removed");
        self.publish(
            EventKind::Remove,
            &EventPayload::Remove {
                record: record.clone(),
                index,
            },
        );
        self.notify_update();
        Some(record)
    }

    /// Merge `patch` into a stored record (matched by identity).
    /// Returns `false`, publishing nothing, if the record is not stored.
    pub fn update(&self, record: &Record, patch: Fields) -> bool {
        let Some(index) = self.inner.collection.position(record) else {
            return false;
        };
        self.apply_update(record.clone(), index, patch);
        true
    }

    /// Merge `fields` into the stored record whose id equals `fields[id]`.
    /// Returns `false`, publishing nothing, if no such record exists.
    pub fn update_by_id(&self, fields: Fields) -> bool {
        let Some(id) = fields.get(&self.inner.config.id_field) else {
            return false;
        };
        let Some((index, record)) = self
            .inner
            .collection
            .find_by(&self.inner.config.id_field, id)
        else {
            return false;
        };
        self.apply_update(record, index, fields);
        true
    }

    fn apply_update(&self, record: Record, index: usize, changes: Fields) {
        record.merge(&changes);
        debug!(index, fields = changes.len(), "record updated");
        self.publish(
            EventKind::RecordUpdate,
            &EventPayload::RecordUpdate {
                record,
                index,
                changes,
            },
        );
        self.notify_update();
    }

    /// Remove every record. Publishes `clear` then `update`.
    pub fn clear(&self) {
        self.inner.collection.replace(Vec::new());
        debug!("collection cleared");
        self.publish(EventKind::Clear, &EventPayload::Clear);
        self.notify_update();
    }

    /// Replace the collection synchronously. Publishes `load` then `update`.
    pub fn load_data(&self, records: impl IntoIterator<Item = Record>) {
        let records: Vec<Record> = records.into_iter().collect();
        self.inner.collection.replace(records.clone());
        debug!(count = records.len(), "collection replaced");
        self.publish(EventKind::Load, &EventPayload::Load { data: records });
        self.notify_update();
    }

    /// Alias of [`load_data`](Self::load_data).
    pub fn set_data(&self, records: impl IntoIterator<Item = Record>) {
        self.load_data(records);
    }

    /// Replace the collection with the configured proxy's records.
    ///
    /// Publishes `beforeload`, then `load` and `update` on success, or
    /// `exception` on failure (the error is also returned). Without a proxy
    /// this resolves to an empty list and publishes nothing. Concurrent
    /// loads are not coordinated: the last one to resolve wins.
    pub async fn load(&self) -> Result<Vec<Record>, CoreError> {
        let Some(proxy) = self.inner.proxy.clone() else {
            debug!("load requested without a proxy; nothing to do");
            return Ok(Vec::new());
        };

        self.publish(EventKind::BeforeLoad, &EventPayload::BeforeLoad);
        match proxy.read().await {
            Ok(records) => {
                self.inner.collection.replace(records.clone());
                self.inner.last_loaded.send_replace(Some(Utc::now()));
                debug!(count = records.len(), "load complete");
                self.publish(
                    EventKind::Load,
                    &EventPayload::Load {
                        data: records.clone(),
                    },
                );
                self.notify_update();
                Ok(records)
            }
            Err(error) => {
                warn!(error = %error, "load failed");
                self.publish(
                    EventKind::Exception,
                    &EventPayload::Exception {
                        error: error.clone(),
                    },
                );
                Err(error)
            }
        }
    }

    // ── Raw access and lookups ───────────────────────────────────────

    /// The raw collection, unfiltered and unsorted.
    ///
    /// The returned `Vec` is a snapshot: later `add`, `remove`, `clear` or
    /// `load` calls swap in a new vector and are not visible through it.
    /// The `Record` handles inside are live, so field writes made through
    /// `update`, `move_node` or `Record::set` show up in both.
    pub fn get_data(&self) -> Arc<Vec<Record>> {
        self.inner.collection.snapshot()
    }

    /// First raw-collection record whose id strictly equals `id`.
    pub fn get_by_id(&self, id: &Value) -> Option<Record> {
        self.inner
            .collection
            .find_by(&self.inner.config.id_field, id)
            .map(|(_, record)| record)
    }

    // ── Tree ─────────────────────────────────────────────────────────

    /// Hierarchical view using the configured tree fields.
    pub fn tree(&self) -> TreeView<'_> {
        TreeView::new(self)
    }

    // ── Subscriptions and metadata ───────────────────────────────────

    /// Stream of raw-collection snapshots, one per `update`.
    pub fn subscribe_changes(&self) -> RecordStream {
        RecordStream::new(self.inner.collection.subscribe())
    }

    /// Number of `update` publications so far.
    pub fn version(&self) -> u64 {
        self.inner.collection.version()
    }

    /// When `load()` last succeeded, if ever.
    pub fn last_loaded(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_loaded.borrow()
    }

    /// How long ago `load()` last succeeded, or `None` if never loaded.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_loaded().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("records", &self.inner.collection.len())
            .field("filters", &self.inner.filters.load().len())
            .field("sorters", &self.inner.sorters.load().len())
            .field("proxy", &self.inner.proxy.is_some())
            .field("events", &self.inner.events)
            .finish()
    }
}
