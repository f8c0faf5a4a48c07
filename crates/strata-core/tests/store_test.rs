//! Integration tests for `DataStore`: CRUD event pairing, loading through a
//! proxy, listener fault isolation, tree round trips, and change streams.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use strata_core::{
    CoreError, DataStore, DuplicateIds, EventPayload, Fields, Filter, FilterOperator, Listener,
    ListenerError, Record, Sorter, StaticProxy, StoreConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn fields(value: Value) -> Fields {
    value.as_object().unwrap().clone()
}

fn records(value: Value) -> Vec<Record> {
    value
        .as_array()
        .unwrap()
        .iter()
        .cloned()
        .map(|v| Record::from_value(v).unwrap())
        .collect()
}

fn ids(records: &[Record]) -> Vec<Value> {
    records.iter().map(|r| r.get("id").unwrap()).collect()
}

fn people() -> DataStore {
    DataStore::builder()
        .records(records(json!([
            {"id": 1, "name": "John", "age": 30},
            {"id": 2, "name": "Jane", "age": 25},
        ])))
        .build()
}

/// Record the name of every event in `names` published by `store`.
fn record_events(store: &DataStore, names: &[&str]) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for &name in names {
        let log = Arc::clone(&log);
        let owned = name.to_owned();
        store.subscribe(
            name,
            Listener::from_fn(move |_| log.lock().unwrap().push(owned.clone())),
        );
    }
    log
}

const MUTATION_EVENTS: &[&str] = &[
    "add",
    "remove",
    "recordupdate",
    "update",
    "clear",
    "beforeload",
    "load",
    "exception",
    "nodemove",
    "nodeadd",
    "noderemove",
];

// ── Store behaviour ─────────────────────────────────────────────────

#[test]
fn sort_by_age_ascending() {
    let store = people();
    store.sort([Sorter::asc("age")]);
    assert_eq!(
        store
            .get_records()
            .iter()
            .map(|r| r.get("name").unwrap())
            .collect::<Vec<_>>(),
        vec![json!("Jane"), json!("John")]
    );
}

#[test]
fn filter_by_minimum_age() {
    let store = people();
    store.filter([Filter::new("age", FilterOperator::Gte, 28)], false);
    assert_eq!(ids(&store.get_records()), vec![json!(1)]);
}

#[test]
fn tree_drops_orphans() {
    let store = DataStore::builder()
        .records(records(json!([
            {"id": 1, "parentId": null},
            {"id": 2, "parentId": 1},
            {"id": 3, "parentId": 99},
        ])))
        .build();

    let tree = store.to_tree();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["id"], json!(1));
    assert_eq!(tree[0]["children"].as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["children"][0]["id"], json!(2));
}

#[test]
fn failing_update_listener_does_not_break_add() {
    let store = people();
    store.subscribe(
        "update",
        Listener::new(|_| Err(ListenerError::new("boom"))),
    );
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    store.subscribe(
        "error",
        Listener::from_fn(move |payload| {
            if let EventPayload::Error { original_event, .. } = payload {
                sink.lock().unwrap().push(original_event.clone());
            }
        }),
    );

    let index = store.add(fields(json!({"id": 3, "name": "Jim"})));
    assert_eq!(index, Ok(2));
    assert_eq!(*errors.lock().unwrap(), vec!["update".to_owned()]);
}

#[test]
fn cyclic_move_is_rejected_and_path_terminates() {
    let store = DataStore::builder()
        .records(records(json!([
            {"id": 1, "parentId": null},
            {"id": 2, "parentId": 1},
            {"id": 3, "parentId": 2},
        ])))
        .build();
    let log = record_events(&store, MUTATION_EVENTS);

    let err = store.move_node(&json!(2), json!(3)).unwrap_err();
    assert_eq!(
        err,
        CoreError::CycleDetected {
            node_id: "2".into(),
            new_parent_id: "3".into(),
        }
    );
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(ids(&store.get_node_path(&json!(2))), vec![json!(1), json!(2)]);
}

#[test]
fn sort_over_sparse_field_puts_missing_last() {
    let rows: Vec<Record> = (0..40)
        .map(|i| {
            let mut row = fields(json!({"id": i}));
            if i % 3 != 0 {
                row.insert("age".into(), json!((i * 7) % 23));
            }
            Record::new(row)
        })
        .collect();
    let store = DataStore::builder().records(rows).build();

    for sorter in [Sorter::asc("age"), Sorter::desc("age")] {
        store.sort([sorter.clone()]);
        let view = store.get_records();
        assert_eq!(view.len(), 40);

        let ages: Vec<Option<i64>> = view
            .iter()
            .map(|r| r.get("age").and_then(|v| v.as_i64()))
            .collect();
        let present: Vec<i64> = ages.iter().map_while(|a| *a).collect();
        assert_eq!(present.len(), 26, "missing ages must trail: {ages:?}");
        assert!(ages[26..].iter().all(Option::is_none));

        let mut expected = present.clone();
        expected.sort_unstable();
        if sorter == Sorter::desc("age") {
            expected.reverse();
        }
        assert_eq!(present, expected);

        // Tied and missing rows keep collection order.
        let missing_ids: Vec<i64> = view[26..]
            .iter()
            .map(|r| r.get("id").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(missing_ids, (0..40).step_by(3).collect::<Vec<i64>>());
    }
}

#[test]
fn sort_over_mixed_types_is_deterministic() {
    let values = [
        json!("10"),
        json!(9.5),
        json!("9"),
        json!("abc"),
        json!(null),
        json!(3),
        json!(true),
        json!([1, 2]),
    ];
    let rows: Vec<Record> = (0..64)
        .map(|i| Record::new(fields(json!({"id": i, "v": values[(i * 5) % values.len()]}))))
        .collect();
    let store = DataStore::builder().records(rows).build();
    store.sort([Sorter::asc("v")]);

    let view = store.get_records();
    assert_eq!(view.len(), 64);

    let mut order: Vec<Value> = view.iter().map(|r| r.get("v").unwrap()).collect();
    order.dedup();
    assert_eq!(
        order,
        vec![
            json!(null),
            json!(true),
            json!(3),
            json!(9.5),
            json!("10"),
            json!("9"),
            json!("abc"),
            json!([1, 2]),
        ]
    );
    assert_eq!(store.get_count(), 64);
    assert!(store.get_at(63).is_some());
}

// ── Event pairing ───────────────────────────────────────────────────

#[test]
fn every_mutation_publishes_one_event_then_update() {
    let store = people();
    let log = record_events(&store, MUTATION_EVENTS);

    store.add(fields(json!({"id": 3}))).unwrap();
    let jane = store.get_by_id(&json!(2)).unwrap();
    assert!(store.update(&jane, fields(json!({"age": 26}))));
    assert!(store.update_by_id(fields(json!({"id": 1, "age": 31}))));
    assert_eq!(store.remove(&jane), Some(1));
    assert!(store.remove_at(0).is_some());
    store.load_data(records(json!([{"id": 9}])));
    store.clear();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "add",
            "update",
            "recordupdate",
            "update",
            "recordupdate",
            "update",
            "remove",
            "update",
            "remove",
            "update",
            "load",
            "update",
            "clear",
            "update",
        ]
    );
    assert_eq!(store.version(), 7);
}

#[test]
fn update_merges_into_the_live_record() {
    let store = people();
    let john = store.get_by_id(&json!(1)).unwrap();
    let changes = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&changes);
    store.subscribe(
        "recordupdate",
        Listener::from_fn(move |payload| {
            if let EventPayload::RecordUpdate { changes, index, .. } = payload {
                *sink.lock().unwrap() = Some((changes.clone(), *index));
            }
        }),
    );

    store.update(&john, fields(json!({"age": 40, "city": "Oslo"})));

    assert_eq!(john.get("age"), Some(json!(40)));
    assert_eq!(john.get("name"), Some(json!("John")));
    assert_eq!(
        changes.lock().unwrap().clone(),
        Some((fields(json!({"age": 40, "city": "Oslo"})), 0))
    );
}

#[test]
fn not_found_operations_are_silent() {
    let store = people();
    let log = record_events(&store, MUTATION_EVENTS);
    let stranger = Record::new(fields(json!({"id": 1})));

    assert_eq!(store.remove(&stranger), None);
    assert!(store.remove_at(10).is_none());
    assert!(!store.update(&stranger, fields(json!({"age": 1}))));
    assert!(!store.update_by_id(fields(json!({"id": 77, "age": 1}))));
    assert!(!store.update_by_id(fields(json!({"age": 1}))));
    assert!(store.get_by_id(&json!(77)).is_none());
    assert_eq!(store.move_node(&json!(77), json!(1)), Ok(false));
    assert_eq!(store.remove_node_with_children(&json!(77)), None);

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(store.version(), 0);
}

#[test]
fn duplicate_ids_follow_policy() {
    let lenient = people();
    lenient.add(fields(json!({"id": 1, "name": "Twin"}))).unwrap();
    assert_eq!(
        lenient.get_by_id(&json!(1)).unwrap().get("name"),
        Some(json!("John"))
    );

    let strict = DataStore::builder()
        .config(StoreConfig {
            duplicate_ids: DuplicateIds::Reject,
            ..StoreConfig::default()
        })
        .records(records(json!([{"id": 1}])))
        .build();
    let log = record_events(&strict, MUTATION_EVENTS);

    assert_eq!(
        strict.add(fields(json!({"id": 1}))),
        Err(CoreError::DuplicateId { id: "1".into() })
    );
    assert!(strict.add(fields(json!({"id": null}))).is_ok());
    assert_eq!(*log.lock().unwrap(), vec!["add", "update"]);
}

// ── Loading ─────────────────────────────────────────────────────────

#[tokio::test]
async fn load_replaces_collection_through_proxy() {
    let store = DataStore::builder()
        .proxy(StaticProxy::new(vec![
            fields(json!({"id": "a"})),
            fields(json!({"id": "b"})),
        ]))
        .records(records(json!([{"id": "old"}])))
        .build();
    let log = record_events(&store, MUTATION_EVENTS);
    assert!(store.last_loaded().is_none());

    let loaded = store.load().await.unwrap();

    assert_eq!(ids(&loaded), vec![json!("a"), json!("b")]);
    assert_eq!(ids(&store.get_data()), vec![json!("a"), json!("b")]);
    assert_eq!(*log.lock().unwrap(), vec!["beforeload", "load", "update"]);
    assert!(store.last_loaded().is_some());
    assert!(store.data_age().is_some());
}

#[tokio::test]
async fn load_failure_publishes_exception_and_returns_error() {
    let failure = CoreError::Proxy {
        message: "connection refused".into(),
    };
    let store = DataStore::builder()
        .proxy(StaticProxy::failing(failure.clone()))
        .records(records(json!([{"id": 1}])))
        .build();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    store.subscribe(
        "exception",
        Listener::from_fn(move |payload| {
            if let EventPayload::Exception { error } = payload {
                *sink.lock().unwrap() = Some(error.clone());
            }
        }),
    );

    assert_eq!(store.load().await, Err(failure.clone()));
    assert_eq!(*seen.lock().unwrap(), Some(failure));
    assert_eq!(store.get_data().len(), 1);
    assert!(store.last_loaded().is_none());
}

#[tokio::test]
async fn load_without_proxy_is_a_quiet_no_op() {
    let store = people();
    let log = record_events(&store, MUTATION_EVENTS);

    assert!(store.load().await.unwrap().is_empty());
    assert_eq!(store.get_data().len(), 2);
    assert!(log.lock().unwrap().is_empty());
}

// ── Reentrancy ──────────────────────────────────────────────────────

#[test]
fn listeners_may_mutate_the_store() {
    let store = people();
    let handle = store.clone();
    store.subscribe_once(
        "add",
        Listener::from_fn(move |payload| {
            if let Some(record) = payload.record() {
                handle.update(record, fields(json!({"seen": true})));
            }
        }),
    );

    store.add(fields(json!({"id": 3}))).unwrap();
    store.add(fields(json!({"id": 4}))).unwrap();

    assert_eq!(store.get_by_id(&json!(3)).unwrap().get("seen"), Some(json!(true)));
    assert_eq!(store.get_by_id(&json!(4)).unwrap().get("seen"), None);
}

// ── Tree round trip and subtree removal ─────────────────────────────

#[test]
fn from_tree_reproduces_parent_pointers() {
    let source = json!([
        {"id": 1, "parentId": null, "label": "root"},
        {"id": 2, "parentId": 1},
        {"id": 3, "parentId": 1},
        {"id": 4, "parentId": 3},
    ]);
    let store = DataStore::builder().records(records(source.clone())).build();

    let mut flat: Vec<Value> = store
        .from_tree(&store.to_tree(), &Value::Null)
        .iter()
        .map(|r| Value::Object(r.to_fields()))
        .collect();
    flat.sort_by_key(|v| v["id"].as_i64());

    assert_eq!(Value::Array(flat), source);
}

#[test]
fn remove_node_with_children_emits_per_record_events() {
    let store = DataStore::builder()
        .records(records(json!([
            {"id": 1, "parentId": null},
            {"id": 2, "parentId": 1},
            {"id": 3, "parentId": 2},
            {"id": 4, "parentId": null},
        ])))
        .build();
    let log = record_events(&store, MUTATION_EVENTS);

    assert_eq!(store.remove_node_with_children(&json!(1)), Some(2));
    assert_eq!(ids(&store.get_data()), vec![json!(4)]);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["remove", "update", "remove", "update", "remove", "update", "noderemove"]
    );
}

#[test]
fn add_child_node_publishes_nodeadd_after_add() {
    let store = people();
    let log = record_events(&store, MUTATION_EVENTS);

    let node = store
        .add_child_node(fields(json!({"id": 5})), json!(1))
        .unwrap();

    assert_eq!(node.get("parentId"), Some(json!(1)));
    assert_eq!(*log.lock().unwrap(), vec!["add", "update", "nodeadd"]);
}

// ── Change streams ──────────────────────────────────────────────────

#[tokio::test]
async fn change_stream_sees_every_update() {
    let store = people();
    let mut changes = store.subscribe_changes();
    assert_eq!(changes.current().len(), 2);

    store.add(fields(json!({"id": 3}))).unwrap();
    let snapshot = changes.changed().await.unwrap();
    assert_eq!(snapshot.len(), 3);

    store.clear();
    let mut stream = store.subscribe_changes().into_stream();
    assert!(stream.next().await.unwrap().is_empty());
}

#[test]
fn filter_and_sort_do_not_touch_the_collection() {
    let store = people();
    store.filter([Filter::equals("name", "Jane")], false);
    store.sort([Sorter::desc("age")]);
    assert_eq!(store.get_data().len(), 2);
    assert_eq!(store.version(), 0);
}

#[test]
fn raw_data_is_a_snapshot_of_live_records() {
    let store = people();
    let data = store.get_data();

    store.add(fields(json!({"id": 3}))).unwrap();
    store.update(&data[0], fields(json!({"age": 31})));

    assert_eq!(data.len(), 2);
    assert_eq!(store.get_data().len(), 3);
    assert_eq!(data[0].get("age"), Some(json!(31)));
}
