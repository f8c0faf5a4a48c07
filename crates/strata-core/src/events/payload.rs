// ── Event names and payloads ──

use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::ListenerError;
use crate::error::CoreError;
use crate::model::{Fields, Filter, Record, Sorter};

/// The stable set of event names published by a `DataStore`.
///
/// Names render in lowercase (`RecordUpdate` is `"recordupdate"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Add,
    Remove,
    RecordUpdate,
    Update,
    Clear,
    BeforeLoad,
    Load,
    Exception,
    Filter,
    Sort,
    NodeMove,
    NodeAdd,
    NodeRemove,
    Error,
}

/// Data delivered to listeners alongside an event name.
#[derive(Debug, Clone)]
pub enum EventPayload {
    Add {
        record: Record,
        index: usize,
    },
    Remove {
        record: Record,
        index: usize,
    },
    RecordUpdate {
        record: Record,
        index: usize,
        changes: Fields,
    },
    Update,
    Clear,
    BeforeLoad,
    Load {
        data: Vec<Record>,
    },
    Exception {
        error: CoreError,
    },
    Filter {
        filters: Vec<Filter>,
    },
    Sort {
        sorters: Vec<Sorter>,
    },
    NodeMove {
        node_id: Value,
        new_parent_id: Value,
        node: Record,
    },
    NodeAdd {
        node: Record,
        parent_id: Value,
    },
    NodeRemove {
        node_id: Value,
        node: Record,
        children_removed: usize,
    },
    /// A listener failed while handling `original_event`.
    Error {
        original_event: String,
        error: ListenerError,
        payload: Box<EventPayload>,
    },
    /// Free-form data for application-defined events.
    Custom(Value),
}

impl EventPayload {
    /// The store event this payload belongs to, or `None` for custom payloads.
    pub fn kind(&self) -> Option<EventKind> {
        let kind = match self {
            Self::Add { .. } => EventKind::Add,
            Self::Remove { .. } => EventKind::Remove,
            Self::RecordUpdate { .. } => EventKind::RecordUpdate,
            Self::Update => EventKind::Update,
            Self::Clear => EventKind::Clear,
            Self::BeforeLoad => EventKind::BeforeLoad,
            Self::Load { .. } => EventKind::Load,
            Self::Exception { .. } => EventKind::Exception,
            Self::Filter { .. } => EventKind::Filter,
            Self::Sort { .. } => EventKind::Sort,
            Self::NodeMove { .. } => EventKind::NodeMove,
            Self::NodeAdd { .. } => EventKind::NodeAdd,
            Self::NodeRemove { .. } => EventKind::NodeRemove,
            Self::Error { .. } => EventKind::Error,
            Self::Custom(_) => return None,
        };
        Some(kind)
    }

    /// The record carried by record-level payloads.
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Add { record, .. }
            | Self::Remove { record, .. }
            | Self::RecordUpdate { record, .. } => Some(record),
            Self::NodeMove { node, .. } | Self::NodeAdd { node, .. } | Self::NodeRemove { node, .. } => {
                Some(node)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn names_are_lowercase_and_round_trip() {
        assert_eq!(EventKind::RecordUpdate.as_ref(), "recordupdate");
        assert_eq!(EventKind::BeforeLoad.to_string(), "beforeload");
        for kind in EventKind::iter() {
            assert_eq!(kind.as_ref().parse::<EventKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn custom_payloads_have_no_kind() {
        assert_eq!(EventPayload::Custom(Value::Null).kind(), None);
        assert_eq!(EventPayload::Update.kind(), Some(EventKind::Update));
    }
}
