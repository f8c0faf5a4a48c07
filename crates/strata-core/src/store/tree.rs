// ── Hierarchical projection ──
//
// Records form a forest through a parent-pointer field. Nothing here is
// cached: every call rebuilds its id and parent indexes from the current
// records. Traversals track visited records, so parent-pointer cycles
// introduced through plain updates end the walk instead of hanging it.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use super::DataStore;
use crate::error::CoreError;
use crate::events::{EventKind, EventPayload};
use crate::model::value::{IdKey, strict_eq};
use crate::model::{Fields, Record};

/// Tree operations over a [`DataStore`], with per-call field overrides.
///
/// ```ignore
/// let roots = store.tree().parent_field("pid").to_tree();
/// ```
#[derive(Debug, Clone)]
pub struct TreeView<'a> {
    store: &'a DataStore,
    parent_field: String,
    children_field: String,
    root_value: Value,
}

impl<'a> TreeView<'a> {
    pub(super) fn new(store: &'a DataStore) -> Self {
        let config = store.config();
        Self {
            store,
            parent_field: config.parent_field.clone(),
            children_field: config.children_field.clone(),
            root_value: config.root_value.clone(),
        }
    }

    #[must_use]
    pub fn parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = field.into();
        self
    }

    #[must_use]
    pub fn children_field(mut self, field: impl Into<String>) -> Self {
        self.children_field = field.into();
        self
    }

    #[must_use]
    pub fn root_value(mut self, value: impl Into<Value>) -> Self {
        self.root_value = value.into();
        self
    }

    fn id_field(&self) -> &str {
        &self.store.config().id_field
    }

    /// Whether `parent` marks a top-level node.
    fn is_root_parent(&self, parent: Option<&Value>) -> bool {
        match parent {
            None | Some(Value::Null) => true,
            Some(value) => strict_eq(value, &self.root_value),
        }
    }

    fn find(&self, records: &[Record], id: &Value) -> Option<Record> {
        records
            .iter()
            .find(|r| r.fields().get(self.id_field()).is_some_and(|v| strict_eq(v, id)))
            .cloned()
    }

    /// Parent id → child positions, in `records` order.
    fn child_index(&self, fields: &[std::sync::Arc<Fields>]) -> HashMap<IdKey, Vec<usize>> {
        let mut index: HashMap<IdKey, Vec<usize>> = HashMap::new();
        for (position, fields) in fields.iter().enumerate() {
            if let Some(parent) = fields.get(&self.parent_field) {
                index.entry(IdKey::of(parent)).or_default().push(position);
            }
        }
        index
    }

    // ── Projection ───────────────────────────────────────────────────

    /// Nest the current view into a forest.
    ///
    /// Each node is a copy of a record's fields plus a children array.
    /// Records whose parent is not in the view are dropped. When several
    /// records share an id, children attach to the first of them.
    pub fn to_tree(&self) -> Vec<Value> {
        let fields: Vec<_> = self.store.get_records().iter().map(Record::fields).collect();

        let mut first_by_id: HashMap<IdKey, usize> = HashMap::new();
        for (position, f) in fields.iter().enumerate() {
            if let Some(id) = f.get(self.id_field()) {
                first_by_id.entry(IdKey::of(id)).or_insert(position);
            }
        }

        let mut roots = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); fields.len()];
        let mut orphans = 0usize;
        for (position, f) in fields.iter().enumerate() {
            let parent = f.get(&self.parent_field);
            if self.is_root_parent(parent) {
                roots.push(position);
            } else if let Some(&owner) = parent.and_then(|p| first_by_id.get(&IdKey::of(p))) {
                children[owner].push(position);
            } else {
                orphans += 1;
            }
        }
        if orphans > 0 {
            debug!(orphans, "dropped records with unknown parents");
        }

        let mut emitted = HashSet::new();
        roots
            .into_iter()
            .filter_map(|root| self.build_node(root, &fields, &children, &mut emitted))
            .collect()
    }

    fn build_node(
        &self,
        position: usize,
        fields: &[std::sync::Arc<Fields>],
        children: &[Vec<usize>],
        emitted: &mut HashSet<usize>,
    ) -> Option<Value> {
        if !emitted.insert(position) {
            return None;
        }
        let nested: Vec<Value> = children[position]
            .iter()
            .filter_map(|&child| self.build_node(child, fields, children, emitted))
            .collect();

        let mut node = Fields::clone(&fields[position]);
        node.insert(self.children_field.clone(), Value::Array(nested));
        Some(Value::Object(node))
    }

    /// Flatten a forest into fresh records, pre-order. Top-level nodes get
    /// the configured root value as parent.
    pub fn from_tree(&self, nodes: &[Value]) -> Vec<Record> {
        self.from_tree_with_parent(nodes, &self.root_value)
    }

    /// Flatten a forest, stamping `parent_id` on top-level nodes. Each
    /// record's children key is stripped; non-object nodes are skipped.
    pub fn from_tree_with_parent(&self, nodes: &[Value], parent_id: &Value) -> Vec<Record> {
        let mut out = Vec::new();
        self.flatten_into(nodes, parent_id, &mut out);
        out
    }

    fn flatten_into(&self, nodes: &[Value], parent_id: &Value, out: &mut Vec<Record>) {
        for node in nodes {
            let Value::Object(node) = node else {
                continue;
            };
            let mut fields = node.clone();
            let children = fields.remove(&self.children_field);
            fields.insert(self.parent_field.clone(), parent_id.clone());
            let id = fields.get(self.id_field()).cloned().unwrap_or(Value::Null);
            out.push(Record::new(fields));

            if let Some(Value::Array(children)) = children {
                self.flatten_into(&children, &id, out);
            }
        }
    }

    // ── Traversal ────────────────────────────────────────────────────

    /// Every transitive descendant of `id` in the collection, pre-order.
    pub fn get_node_children(&self, id: &Value) -> Vec<Record> {
        let records = self.store.get_data();
        self.descendants(&records, id)
    }

    fn descendants(&self, records: &[Record], id: &Value) -> Vec<Record> {
        let fields: Vec<_> = records.iter().map(Record::fields).collect();
        let index = self.child_index(&fields);

        let mut visited: HashSet<usize> = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<usize> = index
            .get(&IdKey::of(id))
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(position) = stack.pop() {
            let is_target = fields[position]
                .get(self.id_field())
                .is_some_and(|v| strict_eq(v, id));
            if is_target || !visited.insert(position) {
                warn!(node = %id, "cycle in parent pointers; descendant walk stopped early");
                continue;
            }
            out.push(records[position].clone());
            if let Some(own_id) = fields[position].get(self.id_field()) {
                if let Some(grandchildren) = index.get(&IdKey::of(own_id)) {
                    stack.extend(grandchildren.iter().rev().copied());
                }
            }
        }
        out
    }

    /// Ancestors of `id` from the root down, ending with the node itself.
    /// Empty if the node does not exist.
    pub fn get_node_path(&self, id: &Value) -> Vec<Record> {
        let records = self.store.get_data();
        let mut by_id: HashMap<IdKey, &Record> = HashMap::new();
        for record in records.iter() {
            if let Some(value) = record.fields().get(self.id_field()) {
                by_id.entry(IdKey::of(value)).or_insert(record);
            }
        }

        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = by_id.get(&IdKey::of(id)).copied();
        while let Some(node) = current {
            if !visited.insert(node.identity()) {
                warn!(node = %id, "cycle in parent pointers; path truncated");
                break;
            }
            path.push(node.clone());
            let fields = node.fields();
            let parent = fields.get(&self.parent_field);
            current = if self.is_root_parent(parent) {
                None
            } else {
                parent.and_then(|p| by_id.get(&IdKey::of(p)).copied())
            };
        }
        path.reverse();
        path
    }

    /// Top-level records of the current view.
    pub fn get_root_nodes(&self) -> Vec<Record> {
        self.store
            .get_records()
            .into_iter()
            .filter(|r| self.is_root_parent(r.fields().get(&self.parent_field)))
            .collect()
    }

    /// Records of the current view whose parent is `id`.
    pub fn get_direct_children(&self, id: &Value) -> Vec<Record> {
        self.store
            .get_records()
            .into_iter()
            .filter(|r| {
                r.fields()
                    .get(&self.parent_field)
                    .is_some_and(|p| strict_eq(p, id))
            })
            .collect()
    }

    pub fn has_children(&self, id: &Value) -> bool {
        self.store.get_records().iter().any(|r| {
            r.fields()
                .get(&self.parent_field)
                .is_some_and(|p| strict_eq(p, id))
        })
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Re-parent a node in place. Publishes `nodemove` then `update`.
    ///
    /// Returns `Ok(false)` if the node does not exist. Moving a node under
    /// itself or one of its descendants fails with `CycleDetected` and
    /// changes nothing.
    pub fn move_node(&self, id: &Value, new_parent_id: Value) -> Result<bool, CoreError> {
        let records = self.store.get_data();
        let Some(node) = self.find(&records, id) else {
            return Ok(false);
        };

        if !self.is_root_parent(Some(&new_parent_id)) {
            let creates_cycle = strict_eq(&new_parent_id, id)
                || self.descendants(&records, id).iter().any(|d| {
                    d.fields()
                        .get(self.id_field())
                        .is_some_and(|v| strict_eq(v, &new_parent_id))
                });
            if creates_cycle {
                return Err(CoreError::CycleDetected {
                    node_id: id.to_string(),
                    new_parent_id: new_parent_id.to_string(),
                });
            }
        }

        node.set(self.parent_field.clone(), new_parent_id.clone());
        debug!(node = %id, parent = %new_parent_id, "node moved");
        self.store.publish(
            EventKind::NodeMove,
            &EventPayload::NodeMove {
                node_id: id.clone(),
                new_parent_id,
                node,
            },
        );
        self.store.notify_update();
        Ok(true)
    }

    /// Add a new record under `parent_id`. Publishes `add` and `update`
    /// through [`DataStore::add`], then `nodeadd`.
    pub fn add_child_node(&self, mut fields: Fields, parent_id: Value) -> Result<Record, CoreError> {
        fields.insert(self.parent_field.clone(), parent_id.clone());
        let node = Record::new(fields);
        self.store.add(node.clone())?;
        self.store.publish(
            EventKind::NodeAdd,
            &EventPayload::NodeAdd {
                node: node.clone(),
                parent_id,
            },
        );
        Ok(node)
    }

    /// Remove a node and all of its descendants.
    ///
    /// Each removal emits its own `remove` and `update`; `noderemove`
    /// follows last. Returns how many descendants were removed, or `None`
    /// if the node does not exist.
    pub fn remove_node_with_children(&self, id: &Value) -> Option<usize> {
        let records = self.store.get_data();
        let node = self.find(&records, id)?;
        let descendants = self.descendants(&records, id);

        let children_removed = descendants
            .iter()
            .filter(|child| self.store.remove(child).is_some())
            .count();
        self.store.remove(&node);

        debug!(node = %id, children_removed, "subtree removed");
        self.store.publish(
            EventKind::NodeRemove,
            &EventPayload::NodeRemove {
                node_id: id.clone(),
                node,
                children_removed,
            },
        );
        Some(children_removed)
    }
}

// ── DataStore delegates ──────────────────────────────────────────────

impl DataStore {
    pub fn to_tree(&self) -> Vec<Value> {
        self.tree().to_tree()
    }

    pub fn from_tree(&self, nodes: &[Value], parent_id: &Value) -> Vec<Record> {
        self.tree().from_tree_with_parent(nodes, parent_id)
    }

    pub fn get_node_children(&self, id: &Value) -> Vec<Record> {
        self.tree().get_node_children(id)
    }

    pub fn get_node_path(&self, id: &Value) -> Vec<Record> {
        self.tree().get_node_path(id)
    }

    pub fn get_root_nodes(&self) -> Vec<Record> {
        self.tree().get_root_nodes()
    }

    pub fn get_direct_children(&self, id: &Value) -> Vec<Record> {
        self.tree().get_direct_children(id)
    }

    pub fn has_children(&self, id: &Value) -> bool {
        self.tree().has_children(id)
    }

    pub fn move_node(&self, id: &Value, new_parent_id: Value) -> Result<bool, CoreError> {
        self.tree().move_node(id, new_parent_id)
    }

    pub fn add_child_node(&self, fields: Fields, parent_id: Value) -> Result<Record, CoreError> {
        self.tree().add_child_node(fields, parent_id)
    }

    pub fn remove_node_with_children(&self, id: &Value) -> Option<usize> {
        self.tree().remove_node_with_children(id)
    }
}
