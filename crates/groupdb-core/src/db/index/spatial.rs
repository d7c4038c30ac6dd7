//! Z-order cell derivation for spatial indexes.
//!
//! A point maps to one cell at full resolution. A box maps to the cells that
//! cover it at the finest level where no more than `max_cells` are needed.

use crate::{
    db::data::Row,
    model::{SpaceBounds, SpatialModel, SpatialShape},
};

/// Bits of resolution per dimension.
const LEVEL_BITS: u32 = 28;

/// Low bits of a z-value reserved for the cell level.
const LEVEL_SHIFT: u32 = 8;

/// Z-values of every cell the row occupies, ascending and distinct.
/// Rows with a null, non-numeric, or non-finite coordinate occupy no cell.
#[must_use]
pub(crate) fn z_values(model: &SpatialModel, row: &Row, max_cells: usize) -> Vec<u64> {
    let coord = |pos: usize| row.value(pos).and_then(crate::value::Value::as_f64);
    let bounds = &model.bounds;

    match model.shape {
        SpatialShape::Point { x, y } => {
            let (Some(x), Some(y)) = (coord(x), coord(y)) else {
                return Vec::new();
            };
            match (x_cell(bounds, x), y_cell(bounds, y)) {
                (Some(cx), Some(cy)) => vec![z_value(cx, cy, LEVEL_BITS)],
                _ => Vec::new(),
            }
        }
        SpatialShape::Box { xlo, ylo, xhi, yhi } => {
            let (Some(xlo), Some(ylo), Some(xhi), Some(yhi)) =
                (coord(xlo), coord(ylo), coord(xhi), coord(yhi))
            else {
                return Vec::new();
            };
            let cells = (
                x_cell(bounds, xlo.min(xhi)),
                x_cell(bounds, xlo.max(xhi)),
                y_cell(bounds, ylo.min(yhi)),
                y_cell(bounds, ylo.max(yhi)),
            );
            let (Some(x0), Some(x1), Some(y0), Some(y1)) = cells else {
                return Vec::new();
            };

            box_cells(x0, x1, y0, y1, max_cells.max(1))
        }
    }
}

fn box_cells(x0: u32, x1: u32, y0: u32, y1: u32, max_cells: usize) -> Vec<u64> {
    let max_cells = u64::try_from(max_cells).unwrap_or(u64::MAX);

    for level in (0..=LEVEL_BITS).rev() {
        let shift = LEVEL_BITS - level;
        let (cx0, cx1, cy0, cy1) = (x0 >> shift, x1 >> shift, y0 >> shift, y1 >> shift);
        let count = u64::from(cx1 - cx0 + 1) * u64::from(cy1 - cy0 + 1);
        if count > max_cells {
            continue;
        }

        let mut out = Vec::new();
        for cx in cx0..=cx1 {
            for cy in cy0..=cy1 {
                out.push(z_value(cx << shift, cy << shift, level));
            }
        }
        out.sort_unstable();
        out.dedup();
        return out;
    }

    // level 0 is a single cell, so the loop always returns
    Vec::new()
}

fn x_cell(bounds: &SpaceBounds, value: f64) -> Option<u32> {
    grid_cell(value, bounds.xmin, bounds.xmax)
}

fn y_cell(bounds: &SpaceBounds, value: f64) -> Option<u32> {
    grid_cell(value, bounds.ymin, bounds.ymax)
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn grid_cell(value: f64, min: f64, max: f64) -> Option<u32> {
    if !value.is_finite() || max.partial_cmp(&min) != Some(std::cmp::Ordering::Greater) {
        return None;
    }

    let cells = f64::from(1u32 << LEVEL_BITS);
    let scaled = ((value - min) / (max - min)).clamp(0.0, 1.0) * cells;
    let last = (1u32 << LEVEL_BITS) - 1;

    Some((scaled as u32).min(last))
}

fn z_value(x: u32, y: u32, level: u32) -> u64 {
    ((spread(x) | (spread(y) << 1)) << LEVEL_SHIFT) | u64::from(level)
}

// Spread the low 32 bits of `v` into the even bit positions.
fn spread(v: u32) -> u64 {
    let mut v = u64::from(v);
    v = (v | (v << 16)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333_3333_3333;
    (v | (v << 1)) & 0x5555_5555_5555_5555
}

///
/// TESTS
///
