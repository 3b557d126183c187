// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point and radius hit testing over a composed set of grids.
//!
//! Each query gathers a cell's records from the target grid and every grid
//! composed into it, orders them back to front by `(primary, secondary)` sort
//! keys (stable, so equal keys keep composition and insertion order), and
//! walks them front to back. The first record that survives every check wins.

use core::fmt::Debug;
use core::hash::Hash;

use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;

use crate::compose::{GridId, GridSet};
use crate::grid::HitTestGrid;
use crate::record::{RecordKey, WidgetRecord};
use crate::types::{CellCoord, UserIndex, WidgetFlags};
use crate::widget::WidgetSource;

/// The winner of a hit test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridHit<K> {
    /// The widget that was hit.
    pub widget: K,
    /// The grid holding the widget's record.
    pub grid: GridId,
    /// The widget's record in that grid.
    pub record: RecordKey,
    /// Squared distance from the query point to the widget; zero for direct hits.
    pub distance_sq: f64,
}

/// One record of a collapsed cell.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate {
    pub(crate) grid: GridId,
    pub(crate) key: RecordKey,
    pub(crate) sort: (i64, i32),
}

#[derive(Clone, Copy, Debug)]
struct Probe {
    window_point: Point,
    radius: f64,
    interactive_only: bool,
    user: UserIndex,
}

impl<K: Copy + Eq + Hash + Debug> HitTestGrid<K> {
    /// Squared distance if `record` accepts the probe, `None` if it rejects it.
    fn probe_record<S>(&self, source: &S, record: &WidgetRecord<K>, probe: &Probe) -> Option<f64>
    where
        S: WidgetSource<K> + ?Sized,
    {
        if !record.user.is_compatible(probe.user) {
            return None;
        }
        let flags = source.flags(&record.widget)?;
        if probe.interactive_only && !flags.contains(WidgetFlags::INTERACTABLE) {
            return None;
        }
        let point = probe.window_point;
        if self
            .culling_rect()
            .is_some_and(|cull| !contains_inclusive(cull, point))
        {
            return None;
        }
        if source.clip_contains(&record.widget, point) == Some(false) {
            return None;
        }
        if self.clips.is_click_through(&record.widget, point) {
            return None;
        }
        let oriented = source.paint_geometry(&record.widget)?.oriented_rect();
        if probe.radius > 0.0 {
            let distance_sq = oriented.distance_sq(point);
            (distance_sq <= probe.radius * probe.radius).then_some(distance_sq)
        } else {
            oriented.contains(point).then_some(0.0)
        }
    }
}

fn contains_inclusive(rect: Rect, point: Point) -> bool {
    (rect.x0..=rect.x1).contains(&point.x) && (rect.y0..=rect.y1).contains(&point.y)
}

impl<K: Copy + Eq + Hash + Debug> GridSet<K> {
    /// Records of `cell` across `grids`, back to front.
    pub(crate) fn collapsed_cell(&self, grids: &[GridId], cell: CellCoord) -> SmallVec<[Candidate; 16]> {
        let mut out: SmallVec<[Candidate; 16]> = SmallVec::new();
        for &id in grids {
            let Some(grid) = self.get(id) else {
                continue;
            };
            for &key in grid.cell_contents(cell) {
                let record = grid.record(key);
                debug_assert!(record.is_some(), "cell references vacant record {key:?}");
                if let Some(record) = record {
                    out.push(Candidate {
                        grid: id,
                        key,
                        sort: record.sort_key(),
                    });
                }
            }
        }
        // Stable: equal keys keep composition, then insertion, order.
        out.sort_by_key(|c| c.sort);
        out
    }

    fn front_most_in_cell<S>(
        &self,
        source: &S,
        grids: &[GridId],
        cell: CellCoord,
        probe: &Probe,
    ) -> Option<(GridHit<K>, (i64, i32))>
    where
        S: WidgetSource<K> + ?Sized,
    {
        for candidate in self.collapsed_cell(grids, cell).iter().rev() {
            let Some(grid) = self.get(candidate.grid) else {
                continue;
            };
            let Some(record) = grid.record(candidate.key) else {
                continue;
            };
            if let Some(distance_sq) = grid.probe_record(source, record, probe) {
                let hit = GridHit {
                    widget: record.widget,
                    grid: candidate.grid,
                    record: candidate.key,
                    distance_sq,
                };
                return Some((hit, candidate.sort));
            }
        }
        None
    }

    /// Find the front-most widget at `desktop_point` in `target` and the grids composed into it.
    ///
    /// The point's own cell is tested first with an exact containment test.
    /// If nothing is hit there and `radius` is positive, every cell touched by
    /// the cursor circle is searched for interactive widgets within `radius`,
    /// and the closest one wins (front-most on ties).
    ///
    /// Points outside the grid are clamped to its edge cells.
    pub fn hit_test<S>(
        &self,
        target: GridId,
        source: &S,
        desktop_point: Point,
        radius: f64,
        user: UserIndex,
    ) -> Option<GridHit<K>>
    where
        S: WidgetSource<K> + ?Sized,
    {
        let grid = self.get(target)?;
        if grid.is_empty() && grid.appended.is_empty() {
            return None;
        }
        let area = *grid.area();
        let grid_point = area.desktop_to_grid(desktop_point);
        let cell = grid.cells.coord_of(grid_point)?;
        let grids = self.collect_composed(target);

        let mut probe = Probe {
            window_point: area.grid_to_window(grid_point),
            radius: 0.0,
            interactive_only: false,
            user,
        };
        if let Some((hit, _)) = self.front_most_in_cell(source, &grids, cell, &probe) {
            tracing::trace!(widget = ?hit.widget, "direct hit");
            return Some(hit);
        }
        if radius.is_nan() || radius <= 0.0 {
            return None;
        }

        probe.radius = radius;
        probe.interactive_only = true;
        let reach = Rect::from_center_size(grid_point, Size::new(2.0 * radius, 2.0 * radius));
        let (upper_left, lower_right) = grid.cells.range_of(reach)?;
        let mut best: Option<(GridHit<K>, (i64, i32))> = None;
        for y in upper_left.y..=lower_right.y {
            for x in upper_left.x..=lower_right.x {
                let found =
                    self.front_most_in_cell(source, &grids, CellCoord::new(x, y), &probe);
                let Some((hit, sort)) = found else {
                    continue;
                };
                let better = best.is_none_or(|(b, b_sort)| {
                    hit.distance_sq < b.distance_sq
                        || (hit.distance_sq == b.distance_sq && sort > b_sort)
                });
                if better {
                    best = Some((hit, sort));
                }
            }
        }
        if let Some((hit, _)) = &best {
            tracing::trace!(widget = ?hit.widget, distance_sq = hit.distance_sq, "radius hit");
        }
        best.map(|(hit, _)| hit)
    }
}
