//! Reactive in-memory record engine.
//!
//! A [`DataStore`] holds an ordered collection of schemaless [`Record`]s and
//! publishes a named event for every change through its [`EventPublisher`].
//! On top of the raw collection it offers:
//!
//! - **Query view**: [`DataStore::get_records`] applies the active
//!   [`Filter`]s (combined with AND, one per property) and then the active
//!   [`Sorter`]s. The view is recomputed on every call.
//!
//! - **Tree projection**: records linked by a parent-pointer field can be
//!   nested with [`DataStore::to_tree`], flattened back with
//!   [`DataStore::from_tree`], and traversed or re-parented through
//!   [`TreeView`].
//!
//! - **Loading**: [`DataStore::load`] pulls records through an injected
//!   [`DataProxy`], bracketed by `beforeload` and `load` / `exception`.
//!
//! - **Change streams**: [`DataStore::subscribe_changes`] vends a
//!   [`RecordStream`] that yields a fresh snapshot on every `update`.
//!
//! Listener faults never escape a publish: they are logged and republished
//! as `error` events.

pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod proxy;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DuplicateIds, StoreConfig};
pub use error::CoreError;
pub use events::{EventKind, EventPayload, EventPublisher, Listener, ListenerError};
pub use model::{Fields, Filter, FilterOperator, Record, SortDirection, Sorter};
pub use proxy::{DataProxy, StaticProxy};
pub use store::{DataStore, DataStoreBuilder, TreeView};
pub use stream::{RecordStream, RecordWatchStream};
