use crate::{
    MAX_INDEX_COLUMNS,
    error::InternalError,
    model::{
        ColumnKind, ColumnModel, GroupId, GroupIndexColumn, GroupIndexModel, GroupModel, HKeyLayout,
        HKeySegmentModel, IndexId, IndexModel, Ordinal, ParentJoin, SpaceBounds, SpatialModel,
        SpatialShape, TableModel,
    },
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// SchemaError
/// Definition errors raised while resolving a schema.
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("unknown group {0}")]
    UnknownGroup(GroupId),

    #[error("duplicate table ordinal {0}")]
    DuplicateOrdinal(Ordinal),

    #[error("duplicate table name '{0}'")]
    DuplicateTable(String),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("table '{0}' declares no primary key")]
    MissingPrimaryKey(String),

    #[error("column '{column}' of table '{table}' is a large object and cannot be keyed")]
    LargeObjectKey { table: String, column: String },

    #[error("table '{table}' joins {found} columns to a parent key of {expected}")]
    JoinArity {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("table '{table}' and its parent '{parent}' are in different groups")]
    CrossGroupJoin { table: String, parent: String },

    #[error("group {group} must have exactly one root table, found {found}")]
    GroupRoot { group: GroupId, found: usize },

    #[error("index '{index}' has {count} columns (max {MAX_INDEX_COLUMNS})")]
    TooManyColumns { index: String, count: usize },

    #[error("spatial index '{0}' needs numeric coordinate columns")]
    SpatialColumns(String),

    #[error("group index '{0}' does not span one root-to-leaf path")]
    GroupIndexPath(String),

    #[error("group index '{0}' lists columns out of hkey order")]
    GroupIndexOrder(String),
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        Self::schema_invariant(err.to_string())
    }
}

///
/// IndexDef
///

#[derive(Clone, Debug)]
pub struct IndexDef {
    name: String,
    columns: Vec<String>,
    unique: bool,
    spatial: Option<(bool, SpaceBounds)>,
}

///
/// TableDef
///
/// Name-based table definition resolved into a [`TableModel`] at build time.
///

#[derive(Clone, Debug)]
pub struct TableDef {
    ordinal: Ordinal,
    name: String,
    group: GroupId,
    version: u32,
    columns: Vec<ColumnModel>,
    primary_key: Vec<String>,
    parent: Option<(String, Vec<String>)>,
    indexes: Vec<IndexDef>,
}

impl TableDef {
    #[must_use]
    pub fn new(ordinal: u32, name: impl Into<String>, group: u32) -> Self {
        Self {
            ordinal: Ordinal(ordinal),
            name: name.into(),
            group: GroupId(group),
            version: 1,
            columns: Vec::new(),
            primary_key: Vec::new(),
            parent: None,
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.columns.push(ColumnModel {
            name: name.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// Join to `parent` through `columns`, listed in parent primary-key order.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>, columns: &[&str]) -> Self {
        self.parent = Some((
            parent.into(),
            columns.iter().map(ToString::to_string).collect(),
        ));
        self
    }

    #[must_use]
    pub fn index(mut self, name: impl Into<String>, columns: &[&str], unique: bool) -> Self {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
            unique,
            spatial: None,
        });
        self
    }

    /// Spatial index over a point `(x, y)`.
    #[must_use]
    pub fn spatial_point(
        mut self,
        name: impl Into<String>,
        x: &str,
        y: &str,
        bounds: SpaceBounds,
    ) -> Self {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: vec![x.to_string(), y.to_string()],
            unique: false,
            spatial: Some((false, bounds)),
        });
        self
    }

    /// Spatial index over a box `(xlo, ylo, xhi, yhi)`.
    #[must_use]
    pub fn spatial_box(
        mut self,
        name: impl Into<String>,
        columns: [&str; 4],
        bounds: SpaceBounds,
    ) -> Self {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
            unique: false,
            spatial: Some((true, bounds)),
        });
        self
    }
}

///
/// GroupIndexDef
///

#[derive(Clone, Debug)]
pub struct GroupIndexDef {
    name: String,
    unique: bool,
    columns: Vec<(String, String)>,
}

impl GroupIndexDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: false,
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn column(mut self, table: &str, column: &str) -> Self {
        self.columns.push((table.to_string(), column.to_string()));
        self
    }
}

///
/// SchemaBuilder
///
/// Tables must be added parent-first.
///

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    groups: Vec<(GroupId, String)>,
    tables: Vec<TableDef>,
    group_indexes: Vec<GroupIndexDef>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn group(mut self, id: u32, name: impl Into<String>) -> Self {
        self.groups.push((GroupId(id), name.into()));
        self
    }

    #[must_use]
    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    #[must_use]
    pub fn group_index(mut self, index: GroupIndexDef) -> Self {
        self.group_indexes.push(index);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut next_index_id = 1u32;
        let mut tables: BTreeMap<Ordinal, TableModel> = BTreeMap::new();
        let mut names: BTreeMap<String, Ordinal> = BTreeMap::new();

        for def in self.tables {
            if !self.groups.iter().any(|(id, _)| *id == def.group) {
                return Err(SchemaError::UnknownGroup(def.group));
            }
            if tables.contains_key(&def.ordinal) {
                return Err(SchemaError::DuplicateOrdinal(def.ordinal));
            }
            if names.contains_key(&def.name) {
                return Err(SchemaError::DuplicateTable(def.name));
            }

            let table = resolve_table(def, &tables, &names, &mut next_index_id)?;
            if let Some(join) = &table.parent
                && let Some(parent) = tables.get_mut(&join.parent)
            {
                parent.children.push(table.ordinal);
            }
            names.insert(table.name.clone(), table.ordinal);
            tables.insert(table.ordinal, table);
        }

        let mut groups = BTreeMap::new();
        for (id, name) in self.groups {
            let roots: Vec<Ordinal> = tables
                .values()
                .filter(|table| table.group == id && table.is_root())
                .map(|table| table.ordinal)
                .collect();
            let [root] = roots.as_slice() else {
                return Err(SchemaError::GroupRoot {
                    group: id,
                    found: roots.len(),
                });
            };
            groups.insert(
                id,
                GroupModel {
                    id,
                    name,
                    root: *root,
                },
            );
        }

        let mut group_indexes = BTreeMap::new();
        for def in self.group_indexes {
            let id = IndexId(next_index_id);
            next_index_id = next_index_id.saturating_add(1);
            let index = resolve_group_index(id, def, &tables, &names)?;
            group_indexes.insert(id, index);
        }

        Ok(Schema {
            tables,
            groups,
            group_indexes,
        })
    }
}

// Resolve names to positions and derive the hkey layout from the parent.
fn resolve_table(
    def: TableDef,
    tables: &BTreeMap<Ordinal, TableModel>,
    names: &BTreeMap<String, Ordinal>,
    next_index_id: &mut u32,
) -> Result<TableModel, SchemaError> {
    let position = |column: &str| -> Result<usize, SchemaError> {
        def.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: def.name.clone(),
                column: column.to_string(),
            })
    };
    let keyable = |pos: usize| -> Result<usize, SchemaError> {
        if def.columns[pos].kind.is_large_object() {
            return Err(SchemaError::LargeObjectKey {
                table: def.name.clone(),
                column: def.columns[pos].name.clone(),
            });
        }
        Ok(pos)
    };

    if def.primary_key.is_empty() {
        return Err(SchemaError::MissingPrimaryKey(def.name.clone()));
    }
    let primary_key = def
        .primary_key
        .iter()
        .map(|name| position(name).and_then(keyable))
        .collect::<Result<Vec<_>, _>>()?;

    let mut segments = Vec::new();
    let parent = match &def.parent {
        Some((parent_name, columns)) => {
            let parent = names
                .get(parent_name)
                .and_then(|ordinal| tables.get(ordinal))
                .ok_or_else(|| SchemaError::UnknownTable(parent_name.clone()))?;
            if parent.group != def.group {
                return Err(SchemaError::CrossGroupJoin {
                    table: def.name.clone(),
                    parent: parent.name.clone(),
                });
            }
            if columns.len() != parent.primary_key.len() {
                return Err(SchemaError::JoinArity {
                    table: def.name.clone(),
                    expected: parent.primary_key.len(),
                    found: columns.len(),
                });
            }
            let columns = columns
                .iter()
                .map(|name| position(name).and_then(keyable))
                .collect::<Result<Vec<_>, _>>()?;
            segments.extend(parent.hkey.segments.iter().cloned());

            Some(ParentJoin {
                parent: parent.ordinal,
                columns,
            })
        }
        None => None,
    };
    segments.push(HKeySegmentModel {
        table: def.ordinal,
        columns: primary_key.clone(),
    });

    let mut indexes = Vec::with_capacity(def.indexes.len() + 1);
    indexes.push(IndexModel {
        id: IndexId(*next_index_id),
        name: format!("{}_pk", def.name),
        columns: primary_key.clone(),
        unique: true,
        primary: true,
        spatial: None,
    });
    *next_index_id = next_index_id.saturating_add(1);

    for index in &def.indexes {
        if index.columns.len() > MAX_INDEX_COLUMNS {
            return Err(SchemaError::TooManyColumns {
                index: index.name.clone(),
                count: index.columns.len(),
            });
        }
        let columns = index
            .columns
            .iter()
            .map(|name| position(name).and_then(keyable))
            .collect::<Result<Vec<_>, _>>()?;

        let spatial = match index.spatial {
            Some((is_box, bounds)) => {
                if columns.iter().any(|pos| !def.columns[*pos].kind.is_numeric()) {
                    return Err(SchemaError::SpatialColumns(index.name.clone()));
                }
                let shape = match (is_box, columns.as_slice()) {
                    (false, [x, y]) => SpatialShape::Point { x: *x, y: *y },
                    (true, [xlo, ylo, xhi, yhi]) => SpatialShape::Box {
                        xlo: *xlo,
                        ylo: *ylo,
                        xhi: *xhi,
                        yhi: *yhi,
                    },
                    _ => return Err(SchemaError::SpatialColumns(index.name.clone())),
                };
                Some(SpatialModel { shape, bounds })
            }
            None => None,
        };

        indexes.push(IndexModel {
            id: IndexId(*next_index_id),
            name: index.name.clone(),
            columns,
            unique: index.unique,
            primary: false,
            spatial,
        });
        *next_index_id = next_index_id.saturating_add(1);
    }

    Ok(TableModel {
        ordinal: def.ordinal,
        name: def.name,
        group: def.group,
        version: def.version,
        columns: def.columns,
        primary_key,
        parent,
        indexes,
        hkey: HKeyLayout { segments },
        children: Vec::new(),
    })
}

// A group index covers the leaf's ancestor chain from its shallowest table.
fn resolve_group_index(
    id: IndexId,
    def: GroupIndexDef,
    tables: &BTreeMap<Ordinal, TableModel>,
    names: &BTreeMap<String, Ordinal>,
) -> Result<GroupIndexModel, SchemaError> {
    if def.columns.len() > MAX_INDEX_COLUMNS {
        return Err(SchemaError::TooManyColumns {
            index: def.name,
            count: def.columns.len(),
        });
    }

    let mut columns = Vec::with_capacity(def.columns.len());
    for (table_name, column_name) in &def.columns {
        let table = names
            .get(table_name)
            .and_then(|ordinal| tables.get(ordinal))
            .ok_or_else(|| SchemaError::UnknownTable(table_name.clone()))?;
        let column =
            table
                .column_position(column_name)
                .ok_or_else(|| SchemaError::UnknownColumn {
                    table: table_name.clone(),
                    column: column_name.clone(),
                })?;
        if table.columns[column].kind.is_large_object() {
            return Err(SchemaError::LargeObjectKey {
                table: table_name.clone(),
                column: column_name.clone(),
            });
        }
        columns.push((table, column));
    }

    let Some(leaf) = columns
        .iter()
        .map(|(table, _)| *table)
        .max_by_key(|table| table.hkey.depth())
    else {
        return Err(SchemaError::GroupIndexPath(def.name));
    };
    let Some(shallowest) = columns.iter().map(|(table, _)| table.hkey.depth()).min() else {
        return Err(SchemaError::GroupIndexPath(def.name));
    };

    let path: Vec<Ordinal> = leaf.hkey.segments[shallowest - 1..]
        .iter()
        .map(|segment| segment.table)
        .collect();

    if columns
        .iter()
        .any(|(table, _)| table.group != leaf.group || !path.contains(&table.ordinal))
    {
        return Err(SchemaError::GroupIndexPath(def.name));
    }
    if columns
        .windows(2)
        .any(|pair| pair[0].0.hkey.depth() > pair[1].0.hkey.depth())
    {
        return Err(SchemaError::GroupIndexOrder(def.name));
    }

    Ok(GroupIndexModel {
        id,
        name: def.name,
        group: leaf.group,
        path,
        columns: columns
            .into_iter()
            .map(|(table, column)| GroupIndexColumn {
                table: table.ordinal,
                column,
            })
            .collect(),
        unique: def.unique,
    })
}

///
/// Schema
///
/// Resolved, read-only schema. All lookups are by ordinal or index id.
///

#[derive(Clone, Debug)]
pub struct Schema {
    tables: BTreeMap<Ordinal, TableModel>,
    groups: BTreeMap<GroupId, GroupModel>,
    group_indexes: BTreeMap<IndexId, GroupIndexModel>,
}

impl Schema {
    pub fn table(&self, ordinal: Ordinal) -> Result<&TableModel, InternalError> {
        self.tables.get(&ordinal).ok_or_else(|| {
            InternalError::schema_invariant(format!("unknown table ordinal {ordinal}"))
        })
    }

    #[must_use]
    pub fn table_by_name(&self, name: &str) -> Option<&TableModel> {
        self.tables.values().find(|table| table.name == name)
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&GroupModel> {
        self.groups.get(&id)
    }

    pub fn group_index(&self, id: IndexId) -> Result<&GroupIndexModel, InternalError> {
        self.group_indexes
            .get(&id)
            .ok_or_else(|| InternalError::schema_invariant(format!("unknown group index {id}")))
    }

    #[must_use]
    pub fn group_index_by_name(&self, name: &str) -> Option<&GroupIndexModel> {
        self.group_indexes.values().find(|index| index.name == name)
    }

    /// Table index by id, with its owning table.
    #[must_use]
    pub fn table_index(&self, id: IndexId) -> Option<(&TableModel, &IndexModel)> {
        self.tables.values().find_map(|table| {
            table
                .indexes
                .iter()
                .find(|index| index.id == id)
                .map(|index| (table, index))
        })
    }

    /// Group indexes whose path includes `table`.
    #[must_use]
    pub fn group_indexes_for(&self, table: Ordinal) -> Vec<&GroupIndexModel> {
        self.group_indexes
            .values()
            .filter(|index| index.covers(table))
            .collect()
    }

    /// All strict descendants of `table`, parent before child.
    #[must_use]
    pub fn descendants(&self, table: Ordinal) -> Vec<Ordinal> {
        let mut out = Vec::new();
        self.collect_descendants(table, &mut out);
        out
    }

    fn collect_descendants(&self, table: Ordinal, out: &mut Vec<Ordinal>) {
        let Some(model) = self.tables.get(&table) else {
            return;
        };
        for child in &model.children {
            out.push(*child);
            self.collect_descendants(*child, out);
        }
    }

    /// Whether `ancestor` appears strictly above `table` in its hkey layout.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: Ordinal, table: Ordinal) -> bool {
        self.tables.get(&table).is_some_and(|model| {
            model
                .hkey
                .ancestor_segments()
                .iter()
                .any(|segment| segment.table == ancestor)
        })
    }
}

///
/// TESTS
///
