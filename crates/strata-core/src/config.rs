// ── Runtime store configuration ──
//
// These types describe how a DataStore interprets its records: which field
// carries identity, which field points at a parent, and what marks a root.
// They never touch disk; `strata-config` builds a `StoreConfig` and hands it in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What `add()` does when the incoming record's id is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIds {
    /// Accept the record. `get_by_id` then returns the first match.
    #[default]
    Allow,
    /// Refuse the record with `CoreError::DuplicateId`.
    Reject,
}

/// Configuration for a single `DataStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Field used for identity lookups (defaults to `"id"`).
    pub id_field: String,
    /// Field holding the parent's id in hierarchical data.
    pub parent_field: String,
    /// Field that receives the nested child array in `to_tree()` output.
    pub children_field: String,
    /// Parent value that marks a top-level node. `null` and absent parents
    /// are always treated as roots as well.
    pub root_value: Value,
    /// Policy for inserting a record whose id is already stored.
    pub duplicate_ids: DuplicateIds,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_field: "id".into(),
            parent_field: "parentId".into(),
            children_field: "children".into(),
            root_value: Value::Null,
            duplicate_ids: DuplicateIds::Allow,
        }
    }
}
