//! Read-only schema metadata: tables, groups, hkey layouts, and the table
//! and group indexes defined over them. Built once by [`SchemaBuilder`] and
//! never mutated by the engine.

mod index;
mod schema;
mod table;

pub use index::{
    GroupIndexColumn, GroupIndexModel, IndexModel, SpaceBounds, SpatialModel, SpatialShape,
};
pub use schema::{GroupIndexDef, IndexDef, Schema, SchemaBuilder, SchemaError, TableDef};
pub use table::{ColumnKind, ColumnModel, HKeyLayout, HKeySegmentModel, ParentJoin, TableModel};

use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Ordinal
///
/// Schema-wide table identifier; the first component of every hkey segment.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Ordinal(pub u32);

///
/// GroupId
///
/// Identifies one physical key space.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct GroupId(pub u32);

///
/// IndexId
///
/// Schema-wide index identifier shared by table and group indexes.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct IndexId(pub u32);

///
/// GroupModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupModel {
    pub id: GroupId,
    pub name: String,
    pub root: Ordinal,
}
