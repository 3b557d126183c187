// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Hit Grid: cell-partitioned hit testing for retained UI widget trees.
//!
//! A [`HitTestGrid`] divides a window-sized area into square cells and records,
//! per cell, which widgets' painted bounds overlap it. The host rebuilds the
//! grid as it paints, handing each widget a [`WidgetSort`] that captures paint
//! order. Queries then look at a single cell and walk its widgets front to back.
//!
//! - Point and radius queries: [`GridSet::hit_test`].
//! - Event routing: [`GridSet::bubble_path`] returns the hit widget and its
//!   ancestors up to the window, root first, in desktop space.
//! - Keyboard and gamepad navigation: [`GridSet::find_next_focusable_widget`]
//!   sweeps the grid in a [`Direction`] under a [`NavigationReply`].
//! - Composition: a grid owned by an embedded surface can be composed into
//!   another with [`GridSet::add_grid`]; queries on the target see both.
//! - Click-clips: [`ClickClip`] regions let parts of a widget pass clicks
//!   through to whatever is behind it.
//!
//! The grid never owns widgets. It stores a host key `K` and asks a
//! [`WidgetSource`] for flags, geometry, and ancestry whenever it needs them.
//!
//! ## Spaces
//!
//! Queries take desktop-space points. Widgets report paint geometry in window
//! space. A grid's [`GridArea`] ties both to its own grid space, in which cells
//! are laid out.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect, Size};
//! use understory_hit_grid::{
//!     Geometry, GridSet, HitTestGrid, UserIndex, WidgetFlags, WidgetSort, WidgetSource,
//! };
//!
//! struct Tree(Vec<Rect>);
//!
//! impl WidgetSource<usize> for Tree {
//!     fn flags(&self, w: &usize) -> Option<WidgetFlags> {
//!         let _ = self.0.get(*w)?;
//!         Some(WidgetFlags::default() | WidgetFlags::INTERACTABLE)
//!     }
//!     fn paint_geometry(&self, w: &usize) -> Option<Geometry> {
//!         self.0.get(*w).copied().map(Geometry::from_rect)
//!     }
//!     fn paint_parent(&self, _: &usize) -> Option<usize> {
//!         None
//!     }
//! }
//!
//! let tree = Tree(vec![
//!     Rect::new(0.0, 0.0, 100.0, 100.0),
//!     Rect::new(50.0, 50.0, 150.0, 150.0),
//! ]);
//! let mut grid = HitTestGrid::new();
//! grid.set_area(Point::ORIGIN, Point::ORIGIN, Size::new(256.0, 256.0));
//! grid.add_widget(&tree, 0, WidgetSort::layer(0));
//! grid.add_widget(&tree, 1, WidgetSort::layer(1));
//!
//! let mut grids = GridSet::new();
//! let id = grids.insert(grid);
//! let hit = |x, y| grids.hit_test(id, &tree, Point::new(x, y), 0.0, UserIndex::Any);
//! assert_eq!(hit(75.0, 75.0).map(|h| h.widget), Some(1));
//! assert_eq!(hit(25.0, 25.0).map(|h| h.widget), Some(0));
//! assert!(hit(200.0, 200.0).is_none());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bubble;
mod cell;
mod clip;
mod compose;
mod error;
mod focus;
mod geometry;
mod grid;
mod record;
mod resolve;
mod types;
mod widget;

#[cfg(test)]
mod test_host;

pub use clip::{ClickClip, ClipRegion, MAX_MASK_CLIPS, MaskClip, PassThrough, PassThroughFn, PixelMask};
pub use compose::{GridId, GridSet};
pub use error::GridError;
pub use focus::{BoundaryRule, Direction, FocusDelegate, NavigationReply};
pub use geometry::{Geometry, OrientedRect};
pub use grid::HitTestGrid;
pub use record::{RecordKey, WidgetRecord};
pub use resolve::GridHit;
pub use types::{
    CellCoord, DEFAULT_CELL_SIZE, GridArea, GridConfig, UserIndex, WidgetFlags, WidgetSort,
};
pub use widget::{ArrangedWidget, CustomHitTestPath, WidgetSource};
