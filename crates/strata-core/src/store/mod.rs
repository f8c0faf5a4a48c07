// ── Reactive record store ──
//
// `DataStore` holds the raw collection and the filter/sorter descriptors.
// Queries, tree projection, and change streams are layered on top in
// sibling modules as further `impl DataStore` blocks.

mod collection;
mod data_store;
mod query;
mod tree;

pub use data_store::{DataStore, DataStoreBuilder};
pub use tree::TreeView;
