use crate::model::{GroupId, IndexId, Ordinal};
use std::fmt::{self, Display};

///
/// IndexModel
/// Runtime descriptor for a single-table index.
///

#[derive(Clone, Debug, PartialEq)]
pub struct IndexModel {
    pub id: IndexId,
    pub name: String,
    pub columns: Vec<usize>,
    pub unique: bool,
    pub primary: bool,
    pub spatial: Option<SpatialModel>,
}

impl IndexModel {
    #[must_use]
    pub const fn is_spatial(&self) -> bool {
        self.spatial.is_some()
    }
}

impl Display for IndexModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.primary {
            write!(f, "PRIMARY {}", self.name)
        } else if self.unique {
            write!(f, "UNIQUE {}", self.name)
        } else if self.spatial.is_some() {
            write!(f, "SPATIAL {}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

///
/// SpatialShape
/// Column positions feeding the z-value derivation.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpatialShape {
    Point {
        x: usize,
        y: usize,
    },
    Box {
        xlo: usize,
        ylo: usize,
        xhi: usize,
        yhi: usize,
    },
}

///
/// SpaceBounds
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpaceBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl SpaceBounds {
    /// Latitude/longitude space.
    pub const GEO: Self = Self {
        xmin: -90.0,
        xmax: 90.0,
        ymin: -180.0,
        ymax: 180.0,
    };
}

///
/// SpatialModel
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialModel {
    pub shape: SpatialShape,
    pub bounds: SpaceBounds,
}

///
/// GroupIndexColumn
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GroupIndexColumn {
    pub table: Ordinal,
    pub column: usize,
}

///
/// GroupIndexModel
///
/// Index whose key spans a contiguous root-to-leaf table path of one group.
/// Columns are listed in hkey order (ancestor columns before descendant
/// columns).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupIndexModel {
    pub id: IndexId,
    pub name: String,
    pub group: GroupId,
    pub path: Vec<Ordinal>,
    pub columns: Vec<GroupIndexColumn>,
    pub unique: bool,
}

impl GroupIndexModel {
    #[must_use]
    pub fn leaf(&self) -> Ordinal {
        self.path.last().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn root(&self) -> Ordinal {
        self.path.first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn covers(&self, table: Ordinal) -> bool {
        self.path.contains(&table)
    }

    /// Columns this index reads from `table`.
    pub fn columns_of(&self, table: Ordinal) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .filter(move |column| column.table == table)
            .map(|column| column.column)
    }
}
