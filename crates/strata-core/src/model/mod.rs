// ── Record model ──
//
// Records are schemaless key/value maps. Everything the store knows about
// them (identity, parent pointers, filter and sort keys) is read dynamically
// through field names, so this module also owns the value semantics used
// for equality, ordering, and string coercion.

pub mod query;
pub mod record;
pub mod value;

// ── Re-exports ──────────────────────────────────────────────────────

pub use query::{Filter, FilterOperator, SortDirection, Sorter};
pub use record::{Fields, Record};
