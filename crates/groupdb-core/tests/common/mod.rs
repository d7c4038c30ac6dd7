//! Fixture shared by the integration suites: the `sales` group
//! customer -> order -> item with two group indexes over the chain.
#![allow(dead_code)]

use groupdb_core::{
    db::{RowStore, backend::MemoryBackend, data::Row, key::HKey, listener::RowListener},
    error::InternalError,
    model::{ColumnKind, GroupIndexDef, IndexId, Ordinal, Schema, SchemaBuilder, TableDef},
    value::Value,
};
use std::cell::RefCell;

pub const CUSTOMER: Ordinal = Ordinal(1);
pub const ORDER: Ordinal = Ordinal(2);
pub const ITEM: Ordinal = Ordinal(3);

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .group(1, "sales")
        .table(
            TableDef::new(1, "customer", 1)
                .column("id", ColumnKind::Int)
                .column("name", ColumnKind::Text)
                .primary_key(&["id"]),
        )
        .table(
            TableDef::new(2, "order", 1)
                .column("id", ColumnKind::Int)
                .column("customer_id", ColumnKind::Int)
                .column("amount", ColumnKind::Float64)
                .primary_key(&["id"])
                .parent("customer", &["customer_id"])
                .index("order_amount", &["amount"], false),
        )
        .table(
            TableDef::new(3, "item", 1)
                .column("id", ColumnKind::Int)
                .column("order_id", ColumnKind::Int)
                .column("qty", ColumnKind::Int)
                .primary_key(&["id"])
                .parent("order", &["order_id"]),
        )
        .group_index(
            GroupIndexDef::new("name_amount")
                .column("customer", "name")
                .column("order", "amount"),
        )
        .group_index(
            GroupIndexDef::new("name_qty")
                .column("customer", "name")
                .column("item", "qty"),
        )
        .build()
        .expect("fixture schema should build")
}

pub fn customer(id: i64, name: &str) -> Row {
    Row::with_version(CUSTOMER, 1, vec![id.into(), name.into()])
}

pub fn order(id: i64, customer_id: i64, amount: f64) -> Row {
    Row::with_version(ORDER, 1, vec![id.into(), customer_id.into(), amount.into()])
}

pub fn item(id: i64, order_id: i64, qty: i64) -> Row {
    Row::with_version(ITEM, 1, vec![id.into(), order_id.into(), qty.into()])
}

pub fn group_index(schema: &Schema, name: &str) -> IndexId {
    schema
        .group_index_by_name(name)
        .map(|index| index.id)
        .expect("group index should exist")
}

/// Number of entries currently held by the named group index.
pub fn group_entries(store: &RowStore<'_>, txn: &MemoryBackend, name: &str) -> usize {
    store
        .scan_index(txn, group_index(store.schema(), name))
        .expect("group index scan")
        .len()
}

/// Stored hkey of the row with primary key `id`, rendered for comparison.
pub fn hkey(store: &RowStore<'_>, txn: &MemoryBackend, table: Ordinal, id: i64) -> Option<String> {
    store
        .read_row(txn, table, &[Value::Int(id)])
        .expect("primary key read")
        .map(|(hkey, _)| hkey.to_string())
}

///
/// HookLog
///

#[derive(Default)]
pub struct HookLog {
    hooks: RefCell<Vec<String>>,
}

impl HookLog {
    pub fn take(&self) -> Vec<String> {
        self.hooks.take()
    }

    fn push(&self, hook: &str, hkey: &HKey) -> Result<(), InternalError> {
        self.hooks.borrow_mut().push(format!("{hook} {hkey}"));
        Ok(())
    }
}

impl RowListener for HookLog {
    fn on_insert_pre(&self, hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        self.push("insert_pre", hkey)
    }

    fn on_delete_pre(&self, hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        self.push("delete_pre", hkey)
    }

    fn on_update_pre(&self, hkey: &HKey, _old: &Row, _new: &Row) -> Result<(), InternalError> {
        self.push("update_pre", hkey)
    }
}
