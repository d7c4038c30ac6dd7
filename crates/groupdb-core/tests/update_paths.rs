mod common;

use common::{HookLog, ITEM, ORDER, customer, hkey, item, order, schema};
use groupdb_core::{
    db::{RowStore, UpdatePath, backend::MemoryBackend, data::Row},
    obs::EventCounters,
    value::Value,
};

fn seeded(store: &RowStore<'_>) -> MemoryBackend {
    let mut txn = MemoryBackend::new();
    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &customer(2, "Ann")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &item(100, 10, 2)).unwrap();
    txn
}

#[test]
fn value_change_stays_in_place() {
    let schema = schema();
    let hooks = HookLog::default();
    let counters = EventCounters::new();
    let store = RowStore::new(&schema)
        .with_listener(&hooks)
        .with_metrics(&counters);
    let mut txn = seeded(&store);
    hooks.take();
    counters.reset();

    let path = store
        .update_row(&mut txn, &item(100, 10, 2), &item(100, 10, 7))
        .unwrap();

    assert_eq!(path, UpdatePath::InPlace);
    assert_eq!(hooks.take(), vec!["update_pre [1:1/2:10/3:100]"]);

    let state = counters.snapshot();
    assert_eq!(state.ops.updates_in_place, 1);
    assert_eq!(state.ops.group_index_removes, 1);
    assert_eq!(state.ops.group_index_inserts, 1);
    assert_eq!(state.ops.propagations, 0);

    let qty = store
        .scan_index(&txn, common::group_index(&schema, "name_qty"))
        .unwrap();
    assert_eq!(qty.len(), 1);
    assert_eq!(qty[0].values, vec![Value::from("Bob"), Value::Int(7)]);
}

#[test]
fn unindexed_change_touches_no_group_index() {
    let schema = schema();
    let counters = EventCounters::new();
    let store = RowStore::new(&schema).with_metrics(&counters);
    let mut txn = seeded(&store);
    counters.reset();

    // amount feeds name_amount only
    store
        .update_row(&mut txn, &order(10, 1, 5.0), &order(10, 1, 8.0))
        .unwrap();

    let state = counters.snapshot();
    let name_qty = common::group_index(&schema, "name_qty");
    assert!(!state.group_indexes.contains_key(&name_qty));
    assert_eq!(state.ops.group_index_inserts, 1);
}

#[test]
fn parent_change_rekeys_the_row_and_its_children() {
    let schema = schema();
    let hooks = HookLog::default();
    let counters = EventCounters::new();
    let store = RowStore::new(&schema)
        .with_listener(&hooks)
        .with_metrics(&counters);
    let mut txn = seeded(&store);
    hooks.take();
    counters.reset();

    let path = store
        .update_row(&mut txn, &order(10, 1, 5.0), &order(10, 2, 5.0))
        .unwrap();

    assert_eq!(path, UpdatePath::Rekeyed);
    assert_eq!(hkey(&store, &txn, ORDER, 10).unwrap(), "[1:2/2:10]");
    assert_eq!(hkey(&store, &txn, ITEM, 100).unwrap(), "[1:2/2:10/3:100]");
    assert_eq!(
        hooks.take(),
        vec![
            "delete_pre [1:1/2:10]",
            "delete_pre [1:1/2:10/3:100]",
            "insert_pre [1:null/2:null/3:100]",
            "insert_pre [1:2/2:10]",
            "delete_pre [1:null/2:null/3:100]",
            "insert_pre [1:2/2:10/3:100]",
        ]
    );

    let state = counters.snapshot();
    assert_eq!(state.ops.updates_rekeyed, 1);
    assert_eq!(state.ops.rows_rekeyed, 2);
}

#[test]
fn version_change_rekeys_only_the_row() {
    let schema = schema();
    let hooks = HookLog::default();
    let store = RowStore::new(&schema).with_listener(&hooks);
    let mut txn = seeded(&store);
    hooks.take();

    let old = order(10, 1, 5.0);
    let new = Row::with_version(ORDER, 2, old.values.clone());
    let path = store.update_row(&mut txn, &old, &new).unwrap();

    assert_eq!(path, UpdatePath::Rekeyed);
    assert_eq!(
        hooks.take(),
        vec!["delete_pre [1:1/2:10]", "insert_pre [1:1/2:10]"]
    );
    assert_eq!(hkey(&store, &txn, ITEM, 100).unwrap(), "[1:1/2:10/3:100]");
    assert_eq!(common::group_entries(&store, &txn, "name_qty"), 1);
}
