// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single hit-test grid: cells, records, click-clips, and composition edges.

use alloc::rc::Weak;
use core::fmt::Debug;
use core::hash::Hash;

use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;

use crate::cell::CellStore;
use crate::clip::{ClickClip, ClickClipRegistry, MaskClip};
use crate::compose::GridId;
use crate::error::GridError;
use crate::geometry::Geometry;
use crate::record::{RecordKey, RecordStore, WidgetRecord};
use crate::types::{CellCoord, GridArea, GridConfig, UserIndex, WidgetFlags, WidgetSort};
use crate::widget::{CustomHitTestPath, WidgetSource};

/// An edge from a grid to a grid composed into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AppendedGrid<K> {
    /// Owner of the composed grid at the time it was appended.
    pub(crate) owner: K,
    pub(crate) grid: GridId,
}

/// Spatial index of widgets over a rectangular area, partitioned into square cells.
///
/// Widgets are added once per frame with their paint-order keys. Queries are
/// answered through a [`GridSet`](crate::GridSet), which also sees the grids
/// composed into this one.
pub struct HitTestGrid<K> {
    config: GridConfig,
    area: GridArea,
    pub(crate) cells: CellStore,
    pub(crate) records: RecordStore<K>,
    pub(crate) clips: ClickClipRegistry<K>,
    pub(crate) appended: SmallVec<[AppendedGrid<K>; 2]>,
    owner: Option<K>,
    culling_rect: Option<Rect>,
    user_index: UserIndex,
}

impl<K: Debug> Debug for HitTestGrid<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HitTestGrid")
            .field("area", &self.area)
            .field("owner", &self.owner)
            .field("records", &self.records)
            .field("cells", &self.cells)
            .field("appended", &self.appended.len())
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash + Debug> Default for HitTestGrid<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Debug> HitTestGrid<K> {
    /// Create an empty grid with the default cell size and a zero area.
    pub fn new() -> Self {
        Self::with_config(GridConfig::default())
    }

    /// Create an empty grid with an explicit configuration.
    pub fn with_config(config: GridConfig) -> Self {
        let config = config.sanitized();
        Self {
            config,
            area: GridArea::default(),
            cells: CellStore::new(config.cell_size),
            records: RecordStore::new(),
            clips: ClickClipRegistry::new(),
            appended: SmallVec::new(),
            owner: None,
            culling_rect: None,
            user_index: UserIndex::Any,
        }
    }

    /// The configuration this grid was built with.
    pub fn config(&self) -> GridConfig {
        self.config
    }

    /// Current placement and partitioning.
    pub fn area(&self) -> &GridArea {
        &self.area
    }

    /// Place the grid and size it.
    ///
    /// When `size` differs from the current size, every cell is reallocated and
    /// all records, click-clips, and composed grids are dropped. Returns `true`
    /// in that case so the caller can resubmit its whole tree.
    pub fn set_area(&mut self, origin: Point, window_origin: Point, size: Size) -> bool {
        let was_reset = self.area.size != size;
        if was_reset {
            let cell_count = self.cells.count_for(size);
            tracing::debug!(
                old = ?self.area.cell_count,
                new = ?cell_count,
                "hit-test grid resized; dropping all records"
            );
            self.area.size = size;
            self.area.cell_count = cell_count;
            self.cells.reset(cell_count);
            self.clear_contents();
        }
        self.area.origin = origin;
        self.area.window_origin = window_origin;
        was_reset
    }

    /// Drop every record, click-clip, and composed grid. The area is kept.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.clear_contents();
    }

    fn clear_contents(&mut self) {
        self.records.clear();
        self.clips.clear();
        self.appended.clear();
    }

    /// Set the user index applied by [`HitTestGrid::add_widget`].
    pub fn set_user_index(&mut self, user: UserIndex) {
        self.user_index = user;
    }

    /// The user index applied by [`HitTestGrid::add_widget`].
    pub fn user_index(&self) -> UserIndex {
        self.user_index
    }

    /// Set the widget that owns this grid. Only owned grids can be composed.
    pub fn set_owner(&mut self, owner: Option<K>) {
        self.owner = owner;
    }

    /// The widget that owns this grid.
    pub fn owner(&self) -> Option<K> {
        self.owner
    }

    /// Restrict hits from this grid to a window-space rectangle.
    pub fn set_culling_rect(&mut self, rect: Option<Rect>) {
        self.culling_rect = rect;
    }

    /// The window-space culling rectangle, if any.
    pub fn culling_rect(&self) -> Option<Rect> {
        self.culling_rect
    }

    /// Register or refresh `widget` using the grid's current user index.
    ///
    /// See [`HitTestGrid::add_widget_for_user`].
    pub fn add_widget<S>(&mut self, source: &S, widget: K, sort: WidgetSort) -> Option<RecordKey>
    where
        S: WidgetSource<K> + ?Sized,
    {
        self.add_widget_for_user(source, widget, sort, self.user_index)
    }

    /// Register or refresh `widget` for `user`.
    ///
    /// Widgets that are gone, not hit-test visible, or lack geometry are
    /// ignored and `None` is returned. If the widget already has a record
    /// covering the same cells, only its sort keys and user index change.
    /// Otherwise the record is replaced; the widget's click-clips, custom
    /// hit-test path, and owned composed grids carry over.
    pub fn add_widget_for_user<S>(
        &mut self,
        source: &S,
        widget: K,
        sort: WidgetSort,
        user: UserIndex,
    ) -> Option<RecordKey>
    where
        S: WidgetSource<K> + ?Sized,
    {
        let flags = source.flags(&widget)?;
        if !flags.contains(WidgetFlags::HIT_TEST_VISIBLE) {
            return None;
        }
        let geometry = source.paint_geometry(&widget)?;
        let bounds = self.window_to_grid(&geometry).bounding_rect();
        let (upper_left, lower_right) = self.cells.range_of(bounds)?;

        let mut custom_path = None;
        if let Some(key) = self.records.key_of(&widget) {
            if let Some(record) = self.records.get_mut(key) {
                if record.covers(upper_left, lower_right) {
                    record.primary_sort = sort.primary();
                    record.secondary_sort = sort.secondary;
                    record.user = user;
                    return Some(key);
                }
            }
            custom_path = self.remove_record(key).and_then(|r| r.custom_path);
        }

        let key = self.records.insert(WidgetRecord {
            widget,
            upper_left,
            lower_right,
            primary_sort: sort.primary(),
            secondary_sort: sort.secondary,
            user,
            custom_path,
        });
        self.cells.insert(key, upper_left, lower_right);
        Some(key)
    }

    fn remove_record(&mut self, key: RecordKey) -> Option<WidgetRecord<K>> {
        let record = self.records.remove(key)?;
        self.cells.remove(key, record.upper_left, record.lower_right);
        Some(record)
    }

    /// Forget `widget`: its record, click-clips, and any grid it owns that was
    /// composed into this one. Returns `true` if a record was removed.
    pub fn remove_widget(&mut self, widget: &K) -> bool {
        let removed = self
            .records
            .key_of(widget)
            .and_then(|key| self.remove_record(key))
            .is_some();
        self.clips.clear_widget(widget);
        self.appended.retain(|edge| edge.owner != *widget);
        removed
    }

    /// Attach a custom hit-test path to an already registered widget.
    pub fn insert_custom_hit_test_path(
        &mut self,
        widget: &K,
        path: Weak<dyn CustomHitTestPath<K>>,
    ) -> Result<(), GridError> {
        let Some(record) = self
            .records
            .key_of(widget)
            .and_then(|key| self.records.get_mut(key))
        else {
            tracing::warn!(?widget, "custom hit-test path for an unregistered widget");
            return Err(GridError::UnknownWidget);
        };
        record.custom_path = Some(path);
        Ok(())
    }

    /// Register a click-clip region for `widget`.
    pub fn add_click_clip(&mut self, widget: K, clip: ClickClip) {
        self.clips.add(widget, clip);
    }

    /// Remove every click-clip region of `widget`.
    pub fn clear_click_clips(&mut self, widget: &K) {
        self.clips.clear_widget(widget);
    }

    /// Replace `widget`'s click-clips with its enabled mask clips painted at `geometry`.
    ///
    /// At most [`MAX_MASK_CLIPS`](crate::MAX_MASK_CLIPS) declarations are used;
    /// each keeps its position in `clips` as its clip index.
    pub fn register_mask_clips(&mut self, widget: K, geometry: &Geometry, clips: &[MaskClip]) {
        self.clips.register_mask_clips(widget, geometry, clips);
    }

    /// Click-clips registered for `widget`.
    pub fn click_clips(&self, widget: &K) -> &[ClickClip] {
        self.clips.clips(widget)
    }

    /// Whether hits on `widget` at a window-space point fall through its click-clips.
    pub fn is_click_through(&self, widget: &K, window_point: Point) -> bool {
        self.clips.is_click_through(widget, window_point)
    }

    /// Number of registered widgets.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no widget is registered.
    pub fn is_empty(&self) -> bool {
        self.records.len() == 0
    }

    /// Whether `widget` has a record.
    pub fn contains_widget(&self, widget: &K) -> bool {
        self.records.key_of(widget).is_some()
    }

    /// The record key of `widget`.
    pub fn record_key(&self, widget: &K) -> Option<RecordKey> {
        self.records.key_of(widget)
    }

    /// Look up a record. Stale keys return `None`.
    pub fn record(&self, key: RecordKey) -> Option<&WidgetRecord<K>> {
        self.records.get(key)
    }

    /// Iterate every live record.
    pub fn records(&self) -> impl Iterator<Item = (RecordKey, &WidgetRecord<K>)> + '_ {
        self.records.iter()
    }

    /// Raw contents of one cell, in insertion order.
    pub fn cell_contents(&self, cell: CellCoord) -> &[RecordKey] {
        self.cells.records(cell)
    }

    /// Cell containing a desktop-space point, clamped to the grid.
    pub fn cell_at(&self, desktop_point: Point) -> Option<CellCoord> {
        self.cells.coord_of(self.area.desktop_to_grid(desktop_point))
    }

    /// Move window-space geometry into grid space.
    pub(crate) fn window_to_grid(&self, geometry: &Geometry) -> Geometry {
        geometry.translated(-self.area.window_origin.to_vec2())
    }

    /// Offset that moves window-space geometry into desktop space.
    pub(crate) fn window_to_desktop(&self) -> Vec2 {
        self.area.origin - self.area.window_origin
    }
}
