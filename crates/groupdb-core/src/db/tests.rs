use crate::{
    config::StoreConfig,
    db::{
        HKeyMaintenanceScope, IndexRow, MutationOptions, RowStore, UpdatePath,
        backend::{Backend, MemoryBackend, ScanEntry},
        data::Row,
        key::HKey,
    },
    error::{ErrorOrigin, InternalError},
    model::{IndexId, Ordinal, Schema},
    obs::EventCounters,
    test_support::{
        ADDRESS, CUSTOMER, ITEM, ORDER, RecordingListener, address, customer, fixture_schema,
        item, order, unique_fixture_schema,
    },
    value::Value,
};

fn index_id(schema: &Schema, name: &str) -> IndexId {
    if let Some(index) = schema.group_index_by_name(name) {
        return index.id;
    }
    for ordinal in [CUSTOMER, ORDER, ITEM, ADDRESS] {
        let table = schema.table(ordinal).unwrap();
        if let Some(index) = table.indexes.iter().find(|index| index.name == name) {
            return index.id;
        }
    }
    panic!("no index named {name}");
}

fn entries(store: &RowStore<'_>, txn: &MemoryBackend, name: &str) -> Vec<IndexRow> {
    store
        .scan_index(txn, index_id(store.schema(), name))
        .expect("index scan")
}

fn hkey_of(store: &RowStore<'_>, txn: &MemoryBackend, table: Ordinal, id: i64) -> String {
    store
        .read_row(txn, table, &[Value::Int(id)])
        .unwrap()
        .map(|(hkey, _)| hkey.to_string())
        .unwrap_or_default()
}

fn stored_rows(txn: &MemoryBackend) -> usize {
    txn.keys().filter(|key| key[0] == 0x10).count()
}

///
/// LockingBackend
///
/// Memory backend that records every lock request.
///

#[derive(Default)]
struct LockingBackend {
    inner: MemoryBackend,
    locks: Vec<Vec<u8>>,
}

impl Backend for LockingBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), InternalError> {
        self.inner.set(key, value)
    }

    fn clear(&mut self, key: &[u8]) -> Result<(), InternalError> {
        self.inner.clear(key)
    }

    fn scan(&self, low: &[u8], high: Option<&[u8]>) -> Result<Vec<ScanEntry>, InternalError> {
        self.inner.scan(low, high)
    }

    fn lock(&mut self, key: &[u8]) -> Result<(), InternalError> {
        self.locks.push(key.to_vec());
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Orphans and adoption
// ─────────────────────────────────────────────

#[test]
fn order_before_customer_is_orphaned_then_adopted_then_orphaned() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    let orphan = store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    assert_eq!(orphan.to_string(), "[1:null/2:10]");

    let parent = store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    assert_eq!(hkey_of(&store, &txn, ORDER, 10), "[1:1/2:10]");
    let adopted = store
        .read_row(&txn, ORDER, &[Value::Int(10)])
        .unwrap()
        .unwrap()
        .0;
    assert!(parent.is_prefix_of(&adopted));

    store.delete_row(&mut txn, &customer(1, "Bob"), false).unwrap();
    assert_eq!(hkey_of(&store, &txn, ORDER, 10), "[1:null/2:10]");
    assert_eq!(store.row_count(&txn, ORDER).unwrap(), 1);
    assert_eq!(store.row_count(&txn, CUSTOMER).unwrap(), 0);
    assert_eq!(stored_rows(&txn), 1);
}

#[test]
fn adoption_carries_grandchildren_along() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &item(100, 10, 2)).unwrap();
    assert_eq!(hkey_of(&store, &txn, ITEM, 100), "[1:null/2:10/3:100]");

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    assert_eq!(hkey_of(&store, &txn, ITEM, 100), "[1:1/2:10/3:100]");

    // the adopted branch is a complete name_qty chain
    let qty = entries(&store, &txn, "name_qty");
    assert_eq!(qty.len(), 1);
    assert_eq!(qty[0].values, vec![Value::from("Bob"), Value::Int(2)]);
}

#[test]
fn unrelated_orphans_are_left_in_place() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();
    let listener = RecordingListener::default();
    let observed = RowStore::new(&schema).with_listener(&listener);

    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &order(20, 2, 7.0)).unwrap();
    observed.write_row(&mut txn, &customer(1, "Bob")).unwrap();

    assert_eq!(hkey_of(&store, &txn, ORDER, 20), "[1:null/2:20]");
    assert!(!listener
        .events()
        .iter()
        .any(|event| event.contains("2:20")));
}

// ─────────────────────────────────────────────
// Group indexes
// ─────────────────────────────────────────────

#[test]
fn group_entry_appears_once_and_is_removed_once() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    assert!(entries(&store, &txn, "name_amount").is_empty());

    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    let rows = entries(&store, &txn, "name_amount");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values, vec![Value::from("Bob"), Value::Float64(5.0)]);
    assert_eq!(rows[0].hkey.to_string(), "[1:1/2:10]");

    store.delete_row(&mut txn, &order(10, 1, 5.0), false).unwrap();
    assert!(entries(&store, &txn, "name_amount").is_empty());

    store.delete_row(&mut txn, &customer(1, "Bob"), false).unwrap();
    assert!(entries(&store, &txn, "name_amount").is_empty());
}

#[test]
fn deleting_the_parent_removes_the_branch_entry() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &item(100, 10, 3)).unwrap();
    assert_eq!(entries(&store, &txn, "name_qty").len(), 1);

    store.delete_row(&mut txn, &customer(1, "Bob"), false).unwrap();
    assert!(entries(&store, &txn, "name_amount").is_empty());
    assert!(entries(&store, &txn, "name_qty").is_empty());
    assert_eq!(hkey_of(&store, &txn, ITEM, 100), "[1:null/2:10/3:100]");
}

#[test]
fn cascade_removes_the_branch_and_each_entry_exactly_once() {
    let schema = fixture_schema();
    let counters = EventCounters::new();
    let store = RowStore::new(&schema).with_metrics(&counters);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &item(100, 10, 3)).unwrap();
    store.write_row(&mut txn, &address(7, 1, 45.0, 7.5)).unwrap();
    store.write_row(&mut txn, &customer(2, "Ann")).unwrap();
    counters.reset();

    store.delete_row(&mut txn, &customer(1, "Bob"), true).unwrap();

    assert_eq!(stored_rows(&txn), 1);
    for table in [ORDER, ITEM, ADDRESS] {
        assert_eq!(store.row_count(&txn, table).unwrap(), 0);
    }
    assert_eq!(store.row_count(&txn, CUSTOMER).unwrap(), 1);
    assert!(entries(&store, &txn, "name_amount").is_empty());
    assert!(entries(&store, &txn, "name_qty").is_empty());
    assert!(entries(&store, &txn, "address_geo").is_empty());
    assert_eq!(entries(&store, &txn, "customer_name").len(), 1);

    let state = counters.snapshot();
    assert_eq!(state.ops.cascades, 1);
    assert_eq!(state.ops.rows_cascaded, 4);
    assert_eq!(state.ops.group_index_removes, 2);
    assert_eq!(state.ops.propagations, 0);
}

#[test]
fn rebuild_restores_a_cleared_group_index() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &order(11, 1, 6.0)).unwrap();
    store.write_row(&mut txn, &order(12, 9, 7.0)).unwrap();
    let before = entries(&store, &txn, "name_amount");

    let id = index_id(&schema, "name_amount");
    store.delete_index_rows(&mut txn, &order(10, 1, 5.0), &[id]).unwrap();
    assert_eq!(entries(&store, &txn, "name_amount").len(), 1);

    store.write_index_rows(&mut txn, &order(10, 1, 5.0), &[id]).unwrap();
    assert_eq!(entries(&store, &txn, "name_amount"), before);

    assert_eq!(store.rebuild_group_index(&mut txn, id).unwrap(), 2);
    assert_eq!(entries(&store, &txn, "name_amount"), before);
}

#[test]
fn index_rows_of_a_missing_row_is_no_such_row() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();
    let id = index_id(&schema, "name_amount");

    let err = store
        .write_index_rows(&mut txn, &order(10, 1, 5.0), &[id])
        .unwrap_err();
    assert!(err.is_no_such_row());
}

// ─────────────────────────────────────────────
// Updates
// ─────────────────────────────────────────────

#[test]
fn non_key_update_is_in_place() {
    let schema = fixture_schema();
    let listener = RecordingListener::default();
    let store = RowStore::new(&schema).with_listener(&listener);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    listener.clear();

    let path = store
        .update_row(&mut txn, &order(10, 1, 5.0), &order(10, 1, 6.0))
        .unwrap();
    assert_eq!(path, UpdatePath::InPlace);
    assert_eq!(
        listener.events(),
        vec!["update_pre [1:1/2:10]", "update_post [1:1/2:10]"]
    );

    let (_, row) = store.read_row(&txn, ORDER, &[Value::Int(10)]).unwrap().unwrap();
    assert_eq!(row, order(10, 1, 6.0));

    let amounts = entries(&store, &txn, "order_amount");
    assert_eq!(amounts.len(), 1);
    assert_eq!(amounts[0].values, vec![Value::Float64(6.0)]);

    let group = entries(&store, &txn, "name_amount");
    assert_eq!(group.len(), 1);
    assert_eq!(group[0].values, vec![Value::from("Bob"), Value::Float64(6.0)]);
}

#[test]
fn signed_zero_amount_refreshes_its_entries() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 0.0)).unwrap();

    let path = store
        .update_row(&mut txn, &order(10, 1, 0.0), &order(10, 1, -0.0))
        .unwrap();
    assert_eq!(path, UpdatePath::InPlace);

    let is_negative_zero =
        |value: &Value| matches!(value, Value::Float64(v) if v.is_sign_negative());

    let amounts = entries(&store, &txn, "order_amount");
    assert_eq!(amounts.len(), 1);
    assert!(is_negative_zero(&amounts[0].values[0]));

    let group = entries(&store, &txn, "name_amount");
    assert_eq!(group.len(), 1);
    assert!(is_negative_zero(&group[0].values[1]));
}

#[test]
fn unique_group_index_rejects_a_second_equal_branch() {
    let schema = unique_fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &customer(2, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();

    let same_parent = store.write_row(&mut txn, &order(11, 1, 5.0)).unwrap_err();
    assert!(same_parent.is_duplicate_key());

    // same name under another customer is the same group key
    let other_parent = store.write_row(&mut txn, &order(12, 2, 5.0)).unwrap_err();
    assert!(other_parent.is_duplicate_key());

    store.write_row(&mut txn, &order(11, 1, 6.0)).unwrap();
    let update = store
        .update_row(&mut txn, &order(11, 1, 6.0), &order(11, 1, 5.0))
        .unwrap_err();
    assert!(update.is_duplicate_key());
}

#[test]
fn unique_group_index_lets_null_components_repeat() {
    let schema = unique_fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();
    let unpriced =
        |id: i64| Row::with_version(ORDER, 1, vec![id.into(), Value::Int(1), Value::Null]);

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &unpriced(10)).unwrap();
    store.write_row(&mut txn, &unpriced(11)).unwrap();

    let group = entries(&store, &txn, "name_amount");
    assert_eq!(group.len(), 2);
    assert!(group.iter().all(|row| row.values[1] == Value::Null));
}

#[test]
fn parent_rename_refreshes_every_chain_below() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &item(100, 10, 3)).unwrap();

    let path = store
        .update_row(&mut txn, &customer(1, "Bob"), &customer(1, "Rob"))
        .unwrap();
    assert_eq!(path, UpdatePath::InPlace);

    for name in ["name_amount", "name_qty"] {
        let rows = entries(&store, &txn, name);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[0], Value::from("Rob"));
    }
    assert_eq!(entries(&store, &txn, "customer_name")[0].values, vec![Value::from("Rob")]);
}

#[test]
fn key_update_rekeys_the_subtree() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &customer(2, "Ann")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &item(100, 10, 3)).unwrap();

    let path = store
        .update_row(&mut txn, &order(10, 1, 5.0), &order(10, 2, 5.0))
        .unwrap();
    assert_eq!(path, UpdatePath::Rekeyed);

    assert_eq!(hkey_of(&store, &txn, ORDER, 10), "[1:2/2:10]");
    assert_eq!(hkey_of(&store, &txn, ITEM, 100), "[1:2/2:10/3:100]");
    assert_eq!(stored_rows(&txn), 4);

    let qty = entries(&store, &txn, "name_qty");
    assert_eq!(qty.len(), 1);
    assert_eq!(qty[0].values[0], Value::from("Ann"));
    assert_eq!(entries(&store, &txn, "name_amount")[0].values[0], Value::from("Ann"));
}

#[test]
fn type_change_without_key_change_leaves_descendants_alone() {
    let schema = fixture_schema();
    let listener = RecordingListener::default();
    let store = RowStore::new(&schema).with_listener(&listener);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &item(100, 10, 3)).unwrap();
    let item_pk_before = entries(&store, &txn, "item_pk");
    listener.clear();

    let old = order(10, 1, 5.0);
    let new = Row::with_version(ORDER, 2, old.values.clone());
    assert_eq!(
        store.update_row(&mut txn, &old, &new).unwrap(),
        UpdatePath::Rekeyed
    );

    assert_eq!(entries(&store, &txn, "item_pk"), item_pk_before);
    assert!(!listener
        .events()
        .iter()
        .any(|event| event.contains("3:100")));
    let (_, stored) = store.read_row(&txn, ORDER, &[Value::Int(10)]).unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(entries(&store, &txn, "name_qty").len(), 1);
}

#[test]
fn large_object_change_takes_the_rekey_path() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();

    let mut with_photo = customer(1, "Bob");
    with_photo.values[2] = Value::Blob(vec![1, 2, 3]);
    assert_eq!(
        store
            .update_row(&mut txn, &customer(1, "Bob"), &with_photo)
            .unwrap(),
        UpdatePath::Rekeyed
    );

    assert_eq!(hkey_of(&store, &txn, ORDER, 10), "[1:1/2:10]");
    assert_eq!(entries(&store, &txn, "name_amount").len(), 1);
}

#[test]
fn spatial_entries_are_rewritten_on_every_in_place_update() {
    let schema = fixture_schema();
    let counters = EventCounters::new();
    let store = RowStore::new(&schema).with_metrics(&counters);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &address(7, 1, 45.0, 7.5)).unwrap();
    let before = entries(&store, &txn, "address_geo");
    assert_eq!(before.len(), 1);
    counters.reset();

    store
        .update_row(&mut txn, &address(7, 1, 45.0, 7.5), &address(7, 1, 45.0, 7.5))
        .unwrap();
    let state = counters.snapshot();
    assert_eq!(state.tables[&ADDRESS].index_inserts, 1);
    assert_eq!(state.tables[&ADDRESS].index_removes, 1);
    assert_eq!(entries(&store, &txn, "address_geo"), before);

    store
        .update_row(&mut txn, &address(7, 1, 45.0, 7.5), &address(7, 1, -30.0, 100.0))
        .unwrap();
    let after = entries(&store, &txn, "address_geo");
    assert_eq!(after.len(), 1);
    assert_ne!(after, before);
}

#[test]
fn cross_table_update_is_rejected() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    let err = store
        .update_row(&mut txn, &order(10, 1, 5.0), &item(10, 1, 5))
        .unwrap_err();
    assert!(!err.is_no_such_row());
}

// ─────────────────────────────────────────────
// Errors, listeners, and hooks
// ─────────────────────────────────────────────

#[test]
fn missing_rows_are_no_such_row() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    let err = store
        .delete_row(&mut txn, &customer(1, "Bob"), false)
        .unwrap_err();
    assert!(err.is_no_such_row());

    let err = store
        .update_row(&mut txn, &order(10, 1, 5.0), &order(10, 1, 6.0))
        .unwrap_err();
    assert!(err.is_no_such_row());
}

#[test]
fn duplicate_primary_keys_are_rejected() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();

    let same_key = store.write_row(&mut txn, &customer(1, "Ann")).unwrap_err();
    assert!(same_key.is_duplicate_key());

    // a different parent gives a different hkey but the same primary key
    let other_parent = store.write_row(&mut txn, &order(10, 2, 1.0)).unwrap_err();
    assert!(other_parent.is_duplicate_key());
}

#[test]
fn rows_are_validated_against_the_table() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    let short = Row::with_version(CUSTOMER, 1, vec![Value::Int(1)]);
    assert!(store.write_row(&mut txn, &short).is_err());

    let wrong_kind = Row::with_version(CUSTOMER, 1, vec![Value::Int(1), Value::Int(2), Value::Null]);
    assert!(store.write_row(&mut txn, &wrong_kind).is_err());

    let null_pk = Row::with_version(CUSTOMER, 1, vec![Value::Null, "x".into(), Value::Null]);
    assert!(store.write_row(&mut txn, &null_pk).is_err());
    assert!(txn.is_empty());
}

#[test]
fn listener_failure_aborts_before_the_write() {
    let schema = fixture_schema();
    let listener = RecordingListener::failing_on("insert_pre");
    let store = RowStore::new(&schema).with_listener(&listener);
    let mut txn = MemoryBackend::new();

    let err = store.write_row(&mut txn, &customer(1, "Bob")).unwrap_err();
    assert_eq!(err.origin, ErrorOrigin::Listener);
    assert_eq!(stored_rows(&txn), 0);
}

#[test]
fn listeners_see_every_step_of_a_delete() {
    let schema = fixture_schema();
    let listener = RecordingListener::default();
    let store = RowStore::new(&schema).with_listener(&listener);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    listener.clear();

    store.delete_row(&mut txn, &customer(1, "Bob"), false).unwrap();
    assert_eq!(
        listener.events(),
        vec![
            "delete_pre [1:1]",
            "delete_post [1:1]",
            "delete_pre [1:1/2:10]",
            "insert_pre [1:null/2:10]",
            "insert_post [1:null/2:10]",
        ]
    );
}

#[test]
fn every_physical_mutation_takes_the_row_lock() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = LockingBackend::default();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store
        .update_row(&mut txn, &order(10, 1, 5.0), &order(10, 1, 6.0))
        .unwrap();
    store.delete_row(&mut txn, &customer(1, "Bob"), true).unwrap();

    // write, write, update, and two cascade removals
    assert_eq!(txn.locks.len(), 5);
    assert!(txn.inner.keys().all(|key| key[0] != 0x10));
}

// ─────────────────────────────────────────────
// Options and configuration
// ─────────────────────────────────────────────

#[test]
fn index_subset_without_primary_skips_the_row_count() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();
    let name = index_id(&schema, "customer_name");

    let options = MutationOptions::new().only_indexes([name]);
    store
        .write_row_with(&mut txn, &customer(1, "Bob"), &options)
        .unwrap();

    assert_eq!(store.row_count(&txn, CUSTOMER).unwrap(), 0);
    assert_eq!(entries(&store, &txn, "customer_name").len(), 1);
    assert!(entries(&store, &txn, "customer_pk").is_empty());
}

#[test]
fn excluded_tables_keep_their_keys_during_propagation() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store.write_row(&mut txn, &address(7, 1, 45.0, 7.5)).unwrap();
    let geo_before = entries(&store, &txn, "address_geo");

    let options = MutationOptions::new().scope(HKeyMaintenanceScope::tables([ORDER]));
    store
        .delete_row_with(&mut txn, &customer(1, "Bob"), false, &options)
        .unwrap();

    assert_eq!(hkey_of(&store, &txn, ORDER, 10), "[1:null/2:10]");
    assert_eq!(hkey_of(&store, &txn, ADDRESS, 7), "[1:1/4:7]");
    assert_eq!(entries(&store, &txn, "address_geo"), geo_before);
}

#[test]
fn disabled_propagation_leaves_orphans_unadopted() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    store.write_row(&mut txn, &order(10, 1, 5.0)).unwrap();
    store
        .write_row_with(
            &mut txn,
            &customer(1, "Bob"),
            &MutationOptions::new().without_propagation(),
        )
        .unwrap();

    assert_eq!(hkey_of(&store, &txn, ORDER, 10), "[1:null/2:10]");
}

#[test]
fn oversized_rows_are_rejected() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema).with_config(StoreConfig::new().debug().with_max_row_bytes(32));
    let mut txn = MemoryBackend::new();

    let mut big = customer(1, "Bob");
    big.values[2] = Value::Blob(vec![7; 64]);
    let err = store.write_row(&mut txn, &big).unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Store);
    assert_eq!(stored_rows(&txn), 0);
}

#[test]
fn read_paths_agree() {
    let schema = fixture_schema();
    let store = RowStore::new(&schema);
    let mut txn = MemoryBackend::new();

    let hkey = store.write_row(&mut txn, &customer(1, "Bob")).unwrap();
    assert_eq!(store.hkey_for(&txn, &customer(1, "Bob")).unwrap(), hkey);
    assert_eq!(
        store.read_row_at(&txn, &hkey).unwrap(),
        Some(customer(1, "Bob"))
    );
    assert_eq!(store.read_row(&txn, CUSTOMER, &[Value::Int(2)]).unwrap(), None);
    assert_eq!(store.read_row_at(&txn, &HKey::new()).unwrap(), None);
}
