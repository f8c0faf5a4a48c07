// ── Record handle ──
//
// A Record is a shared, mutable field map. Cloning a Record clones the
// handle; every clone observes the same fields. Writes are copy-on-write
// through `ArcSwap`, so readers never block and never see a torn map.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The raw key/value content of a record.
pub type Fields = Map<String, Value>;

/// One addressable unit of data held by a `DataStore`.
///
/// Identity is handle identity: two `Record`s are the same record iff
/// [`Record::ptr_eq`] holds. Field equality says nothing about identity.
#[derive(Clone)]
pub struct Record {
    cell: Arc<ArcSwap<Fields>>,
}

impl Record {
    pub fn new(fields: Fields) -> Self {
        Self {
            cell: Arc::new(ArcSwap::from_pointee(fields)),
        }
    }

    /// Build a record from a JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(fields)),
            _ => None,
        }
    }

    /// Whether both handles point at the same record.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }

    /// Current fields (cheap `Arc` clone of an immutable snapshot).
    pub fn fields(&self) -> Arc<Fields> {
        self.cell.load_full()
    }

    /// Value of a single field, if present.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.cell.load().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cell.load().contains_key(key)
    }

    /// Set one field in place. Visible through every handle.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.cell.rcu(|current| {
            let mut next = Fields::clone(current);
            next.insert(key.clone(), value.clone());
            next
        });
    }

    /// Shallow-merge `patch` into this record, overwriting existing keys.
    pub fn merge(&self, patch: &Fields) {
        if patch.is_empty() {
            return;
        }
        self.cell.rcu(|current| {
            let mut next = Fields::clone(current);
            for (key, value) in patch {
                next.insert(key.clone(), value.clone());
            }
            next
        });
    }

    /// Remove a field, returning its previous value.
    pub fn remove_field(&self, key: &str) -> Option<Value> {
        let previous = self.cell.rcu(|current| {
            let mut next = Fields::clone(current);
            next.remove(key);
            next
        });
        previous.get(key).cloned()
    }

    /// Owned copy of the current fields.
    pub fn to_fields(&self) -> Fields {
        Fields::clone(&self.cell.load())
    }

    /// A new, independent record with a copy of this record's fields.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self::new(self.to_fields())
    }

    /// Address of the shared cell, used internally as an identity key.
    pub(crate) fn identity(&self) -> *const ArcSwap<Fields> {
        Arc::as_ptr(&self.cell)
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self::new(fields)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Record").field(&*self.fields()).finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Fields::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn clones_share_storage() {
        let a = record(json!({"id": 1, "name": "John"}));
        let b = a.clone();
        b.set("name", "Johnny");

        assert_eq!(a.get("name"), Some(json!("Johnny")));
        assert!(Record::ptr_eq(&a, &b));
    }

    #[test]
    fn detached_copy_is_a_different_record() {
        let a = record(json!({"id": 1}));
        let b = a.detached();
        b.set("id", 2);

        assert_eq!(a.get("id"), Some(json!(1)));
        assert!(!Record::ptr_eq(&a, &b));
    }

    #[test]
    fn merge_overwrites_and_adds() {
        let r = record(json!({"id": 1, "age": 30}));
        let patch = json!({"age": 31, "city": "Oslo"});
        r.merge(patch.as_object().unwrap());

        assert_eq!(r.get("age"), Some(json!(31)));
        assert_eq!(r.get("city"), Some(json!("Oslo")));
        assert_eq!(r.get("id"), Some(json!(1)));
    }

    #[test]
    fn remove_field_returns_previous_value() {
        let r = record(json!({"id": 1, "tmp": true}));
        assert_eq!(r.remove_field("tmp"), Some(json!(true)));
        assert_eq!(r.remove_field("tmp"), None);
        assert!(!r.contains("tmp"));
    }

    #[test]
    fn snapshots_are_stable_after_writes() {
        let r = record(json!({"n": 1}));
        let before = r.fields();
        r.set("n", 2);

        assert_eq!(before.get("n"), Some(&json!(1)));
        assert_eq!(r.get("n"), Some(json!(2)));
    }

    #[test]
    fn non_objects_are_not_records() {
        assert!(Record::from_value(json!([1, 2])).is_none());
        assert!(Record::from_value(json!("x")).is_none());
    }

    #[test]
    fn serde_uses_plain_object_shape() {
        let r: Record = serde_json::from_str(r#"{"id":7,"tags":["a"]}"#).unwrap();
        assert_eq!(r.get("id"), Some(json!(7)));
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"id": 7, "tags": ["a"]}));
    }
}
