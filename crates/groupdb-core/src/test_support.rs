//! Shared unit-test fixture: the `sales` group
//! customer -> order -> item, with address as a second child of customer.

use crate::{
    db::{data::Row, key::HKey, listener::RowListener},
    error::InternalError,
    model::{ColumnKind, GroupIndexDef, Ordinal, Schema, SchemaBuilder, SpaceBounds, TableDef},
    value::Value,
};
use std::cell::RefCell;

pub(crate) const CUSTOMER: Ordinal = Ordinal(1);
pub(crate) const ORDER: Ordinal = Ordinal(2);
pub(crate) const ITEM: Ordinal = Ordinal(3);
pub(crate) const ADDRESS: Ordinal = Ordinal(4);

pub(crate) fn fixture_schema() -> Schema {
    sales_schema(false)
}

/// The same group with `name_amount` declared unique.
pub(crate) fn unique_fixture_schema() -> Schema {
    sales_schema(true)
}

fn sales_schema(unique_name_amount: bool) -> Schema {
    let mut name_amount = GroupIndexDef::new("name_amount")
        .column("customer", "name")
        .column("order", "amount");
    if unique_name_amount {
        name_amount = name_amount.unique();
    }

    SchemaBuilder::new()
        .group(1, "sales")
        .table(
            TableDef::new(1, "customer", 1)
                .column("id", ColumnKind::Int)
                .column("name", ColumnKind::Text)
                .column("photo", ColumnKind::Blob)
                .primary_key(&["id"])
                .index("customer_name", &["name"], false),
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
        .table(
            TableDef::new(4, "address", 1)
                .column("id", ColumnKind::Int)
                .column("customer_id", ColumnKind::Int)
                .column("lat", ColumnKind::Float64)
                .column("lon", ColumnKind::Float64)
                .primary_key(&["id"])
                .parent("customer", &["customer_id"])
                .spatial_point("address_geo", "lat", "lon", SpaceBounds::GEO),
        )
        .group_index(name_amount)
        .group_index(
            GroupIndexDef::new("name_qty")
                .column("customer", "name")
                .column("item", "qty"),
        )
        .build()
        .expect("fixture schema should build")
}

pub(crate) fn customer(id: i64, name: &str) -> Row {
    Row::with_version(CUSTOMER, 1, vec![id.into(), name.into(), Value::Null])
}

pub(crate) fn order(id: i64, customer_id: i64, amount: f64) -> Row {
    Row::with_version(ORDER, 1, vec![id.into(), customer_id.into(), amount.into()])
}

pub(crate) fn item(id: i64, order_id: i64, qty: i64) -> Row {
    Row::with_version(ITEM, 1, vec![id.into(), order_id.into(), qty.into()])
}

pub(crate) fn address(id: i64, customer_id: i64, lat: f64, lon: f64) -> Row {
    Row::with_version(
        ADDRESS,
        1,
        vec![id.into(), customer_id.into(), lat.into(), lon.into()],
    )
}

///
/// RecordingListener
///
/// Records every hook as `"<hook> <hkey>"`; optionally fails one hook.
///

#[derive(Debug, Default)]
pub(crate) struct RecordingListener {
    events: RefCell<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl RecordingListener {
    pub(crate) fn failing_on(hook: &'static str) -> Self {
        Self {
            events: RefCell::default(),
            fail_on: Some(hook),
        }
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn hit(&self, hook: &'static str, hkey: &HKey) -> Result<(), InternalError> {
        self.events.borrow_mut().push(format!("{hook} {hkey}"));
        if self.fail_on == Some(hook) {
            return Err(InternalError::listener(format!("{hook} rejected {hkey}")));
        }

        Ok(())
    }
}

impl RowListener for RecordingListener {
    fn on_insert_pre(&self, hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        self.hit("insert_pre", hkey)
    }

    fn on_insert_post(&self, hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        self.hit("insert_post", hkey)
    }

    fn on_delete_pre(&self, hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        self.hit("delete_pre", hkey)
    }

    fn on_delete_post(&self, hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        self.hit("delete_post", hkey)
    }

    fn on_update_pre(&self, hkey: &HKey, _old: &Row, _new: &Row) -> Result<(), InternalError> {
        self.hit("update_pre", hkey)
    }

    fn on_update_post(&self, hkey: &HKey, _old: &Row, _new: &Row) -> Result<(), InternalError> {
        self.hit("update_post", hkey)
    }
}
