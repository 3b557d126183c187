// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dense cell storage for one grid.
//!
//! Each cell lists the records whose bounds overlap it, in insertion order.
//! Display order is decided at query time, so cells never need re-sorting when
//! sort keys change.

use alloc::vec::Vec;
use core::fmt::Debug;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;

use crate::record::RecordKey;
use crate::types::CellCoord;

#[derive(Clone, Debug, Default)]
struct Cell {
    records: SmallVec<[RecordKey; 8]>,
}

/// Fixed-size square cells covering a grid area.
#[derive(Clone)]
pub(crate) struct CellStore {
    cell_size: f64,
    count: CellCoord,
    cells: Vec<Cell>,
}

impl Debug for CellStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let occupied = self.cells.iter().filter(|c| !c.records.is_empty()).count();
        f.debug_struct("CellStore")
            .field("cell_size", &self.cell_size)
            .field("count", &self.count)
            .field("occupied", &occupied)
            .finish_non_exhaustive()
    }
}

impl CellStore {
    pub(crate) fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell_size must be strictly positive");
        Self {
            cell_size,
            count: CellCoord::default(),
            cells: Vec::new(),
        }
    }

    pub(crate) fn count(&self) -> CellCoord {
        self.count
    }

    /// Number of cells needed to cover `size`: `ceil(size / cell_size)` per axis.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Cell counts are clamped to the u32 range before the cast."
    )]
    pub(crate) fn count_for(&self, size: Size) -> CellCoord {
        let axis = |extent: f64| {
            if extent.is_finite() && extent > 0.0 {
                (extent / self.cell_size).ceil().min(f64::from(u32::MAX)) as u32
            } else {
                0
            }
        };
        CellCoord::new(axis(size.width), axis(size.height))
    }

    /// Drop every registration and reallocate for `count` cells.
    pub(crate) fn reset(&mut self, count: CellCoord) {
        self.count = count;
        self.cells.clear();
        self.cells
            .resize_with(count.x as usize * count.y as usize, Cell::default);
    }

    /// Drop every registration, keeping the cell layout.
    pub(crate) fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.records.clear();
        }
    }

    /// Cell containing a grid-space point, clamped to the nearest edge cell.
    ///
    /// Returns `None` only when the grid has no cells.
    pub(crate) fn coord_of(&self, point: Point) -> Option<CellCoord> {
        if self.count.x == 0 || self.count.y == 0 {
            return None;
        }
        Some(CellCoord::new(
            self.axis_coord(point.x, self.count.x),
            self.axis_coord(point.y, self.count.y),
        ))
    }

    /// Clamped cell index along one axis.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "The value is floored and clamped to [0, count - 1] before the cast."
    )]
    pub(crate) fn axis_coord(&self, value: f64, count: u32) -> u32 {
        let max = f64::from(count.saturating_sub(1));
        let t = (value / self.cell_size).floor();
        // NaN falls through both comparisons and lands on cell 0.
        if t >= max {
            max as u32
        } else if t > 0.0 {
            t as u32
        } else {
            0
        }
    }

    /// Inclusive cell range covered by a grid-space rectangle.
    pub(crate) fn range_of(&self, rect: Rect) -> Option<(CellCoord, CellCoord)> {
        let upper_left = self.coord_of(Point::new(rect.x0, rect.y0))?;
        let lower_right = self.coord_of(Point::new(rect.x1, rect.y1))?;
        Some((upper_left, lower_right))
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        (coord.x < self.count.x && coord.y < self.count.y)
            .then(|| coord.y as usize * self.count.x as usize + coord.x as usize)
    }

    /// Records registered in one cell, in insertion order.
    pub(crate) fn records(&self, coord: CellCoord) -> &[RecordKey] {
        self.index(coord)
            .and_then(|i| self.cells.get(i))
            .map(|c| c.records.as_slice())
            .unwrap_or_default()
    }

    /// Register `key` in every cell of the inclusive range.
    pub(crate) fn insert(&mut self, key: RecordKey, upper_left: CellCoord, lower_right: CellCoord) {
        for y in upper_left.y..=lower_right.y {
            for x in upper_left.x..=lower_right.x {
                if let Some(i) = self.index(CellCoord::new(x, y)) {
                    self.cells[i].records.push(key);
                }
            }
        }
    }

    /// Unregister `key` from every cell of the inclusive range.
    pub(crate) fn remove(&mut self, key: RecordKey, upper_left: CellCoord, lower_right: CellCoord) {
        for y in upper_left.y..=lower_right.y {
            for x in upper_left.x..=lower_right.x {
                let Some(i) = self.index(CellCoord::new(x, y)) else {
                    continue;
                };
                let records = &mut self.cells[i].records;
                let pos = records.iter().position(|&k| k == key);
                debug_assert!(pos.is_some(), "record {key:?} missing from cell ({x}, {y})");
                if let Some(pos) = pos {
                    // Ordered removal; ties between equal sort keys follow insertion order.
                    records.remove(pos);
                }
            }
        }
    }
}
