use crate::{
    model::{GroupId, IndexModel, Ordinal},
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// ColumnKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ColumnKind {
    Bool,
    Int,
    Uint,
    Float64,
    Text,
    Blob,
}

impl ColumnKind {
    /// Large objects are stored with the row but never keyed.
    #[must_use]
    pub const fn is_large_object(self) -> bool {
        matches!(self, Self::Blob)
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float64)
    }

    /// Whether `value` is storable in a column of this kind.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Uint, Value::Uint(_))
                | (Self::Float64, Value::Float64(_))
                | (Self::Text, Value::Text(_))
                | (Self::Blob, Value::Blob(_))
        )
    }
}

///
/// ColumnModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnModel {
    pub name: String,
    pub kind: ColumnKind,
}

///
/// ParentJoin
///
/// Child-side join columns, positionally matching the parent's primary key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParentJoin {
    pub parent: Ordinal,
    pub columns: Vec<usize>,
}

///
/// HKeySegmentModel
///
/// One `(table ordinal, key columns)` step of a table's hkey layout.
/// `columns` are positions within the segment table's own row.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HKeySegmentModel {
    pub table: Ordinal,
    pub columns: Vec<usize>,
}

///
/// HKeyLayout
///
/// Root-first segment list; the last segment belongs to the table itself.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HKeyLayout {
    pub segments: Vec<HKeySegmentModel>,
}

impl HKeyLayout {
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Segments owned by ancestors (everything but the last).
    #[must_use]
    pub fn ancestor_segments(&self) -> &[HKeySegmentModel] {
        match self.segments.split_last() {
            Some((_, ancestors)) => ancestors,
            None => &[],
        }
    }
}

///
/// TableModel
///
/// Read-only table metadata resolved by [`crate::model::SchemaBuilder`].
/// `version` identifies the row type; it changes when the table is altered.
///

#[derive(Clone, Debug)]
pub struct TableModel {
    pub ordinal: Ordinal,
    pub name: String,
    pub group: GroupId,
    pub version: u32,
    pub columns: Vec<ColumnModel>,
    pub primary_key: Vec<usize>,
    pub parent: Option<ParentJoin>,
    pub indexes: Vec<IndexModel>,

    pub(crate) hkey: HKeyLayout,
    pub(crate) children: Vec<Ordinal>,
}

impl TableModel {
    #[must_use]
    pub const fn hkey_layout(&self) -> &HKeyLayout {
        &self.hkey
    }

    #[must_use]
    pub fn children(&self) -> &[Ordinal] {
        &self.children
    }

    #[must_use]
    pub const fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The table's primary-key index (always present, always first).
    #[must_use]
    pub fn primary_index(&self) -> Option<&IndexModel> {
        self.indexes.iter().find(|index| index.primary)
    }

    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Primary-key columns plus child-side parent join columns.
    /// These are the only columns that can move a row's hkey.
    #[must_use]
    pub fn key_fields(&self) -> Vec<usize> {
        let mut fields = self.primary_key.clone();
        if let Some(join) = &self.parent {
            for column in &join.columns {
                if !fields.contains(column) {
                    fields.push(*column);
                }
            }
        }

        fields
    }

    #[must_use]
    pub fn large_object_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.kind.is_large_object())
            .map(|(pos, _)| pos)
            .collect()
    }
}
