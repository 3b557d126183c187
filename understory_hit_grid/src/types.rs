// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain value types shared by the grid, the resolvers, and widget hosts.

use kurbo::{Point, Size};

/// Side length of a square grid cell, in grid-space units.
pub const DEFAULT_CELL_SIZE: f64 = 128.0;

bitflags::bitflags! {
    /// Capability flags a widget host reports for each widget.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct WidgetFlags: u8 {
        /// Widget takes part in hit testing at all.
        const HIT_TEST_VISIBLE = 0b0000_0001;
        /// Widget reacts to pointer input; only these are considered by radius queries.
        const INTERACTABLE     = 0b0000_0010;
        /// Widget is enabled. Disabled widgets trim bubble paths and are never focused.
        const ENABLED          = 0b0000_0100;
        /// Widget supports keyboard focus.
        const FOCUSABLE        = 0b0000_1000;
        /// Widget is a root (window). Bubble paths must end at one.
        const WINDOW           = 0b0001_0000;
    }
}

impl Default for WidgetFlags {
    fn default() -> Self {
        Self::HIT_TEST_VISIBLE | Self::ENABLED
    }
}

/// The user (local player or input owner) a widget or query belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UserIndex {
    /// Matches every user.
    #[default]
    Any,
    /// A single user.
    User(u32),
}

impl UserIndex {
    /// Returns `true` if a widget tagged `self` may answer a query from `other`.
    ///
    /// Either side being [`UserIndex::Any`] is always compatible.
    #[must_use]
    pub const fn is_compatible(self, other: Self) -> bool {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::User(a), Self::User(b)) => a == b,
        }
    }
}

/// Paint-order keys used to order overlapping widgets front to back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WidgetSort {
    /// Coarse batch group; dominates `layer`.
    pub batch_priority: i32,
    /// Layer id within the batch group.
    pub layer: i32,
    /// Fine-grained tie breaker for equal primary keys.
    pub secondary: i32,
}

impl WidgetSort {
    /// Create sort keys from their parts.
    #[must_use]
    pub const fn new(batch_priority: i32, layer: i32, secondary: i32) -> Self {
        Self {
            batch_priority,
            layer,
            secondary,
        }
    }

    /// Sort keys for a plain layer id with no batch group or secondary key.
    #[must_use]
    pub const fn layer(layer: i32) -> Self {
        Self::new(0, layer, 0)
    }

    /// The combined 64-bit primary key, ordered by `(batch_priority, layer)`.
    ///
    /// The layer is biased into `[0, 2^32)` and packed into the low half, so the
    /// key never overflows and negative layers still sort below positive ones.
    #[must_use]
    #[allow(
        clippy::cast_sign_loss,
        clippy::cast_lossless,
        reason = "Bit-level reinterpretation of the layer for packing."
    )]
    pub const fn primary(self) -> i64 {
        let biased_layer = (self.layer as u32 ^ 0x8000_0000) as i64;
        ((self.batch_priority as i64) << 32) | biased_layer
    }
}

/// Coordinates of one grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl CellCoord {
    /// Create a cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Component along `axis`.
    pub(crate) const fn on(self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// A horizontal or vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

impl Axis {
    pub(crate) const fn cross(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Placement and partitioning of a grid.
///
/// Three spaces are involved. Queries arrive in desktop space. Widgets report geometry in
/// window (paint) space. Cells are laid out in grid space, whose origin is `origin` in
/// desktop space and `window_origin` in window space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridArea {
    /// Top-left corner of the grid in desktop space.
    pub origin: Point,
    /// Top-left corner of the grid in window space.
    pub window_origin: Point,
    /// Extent of the grid.
    pub size: Size,
    /// Number of cells along each axis.
    pub cell_count: CellCoord,
}

impl GridArea {
    /// Desktop point to grid space.
    #[must_use]
    pub fn desktop_to_grid(&self, point: Point) -> Point {
        (point - self.origin).to_point()
    }

    /// Grid point to window space.
    #[must_use]
    pub fn grid_to_window(&self, point: Point) -> Point {
        point + self.window_origin.to_vec2()
    }

    /// Total number of cells.
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.cell_count.x as usize * self.cell_count.y as usize
    }
}

/// Construction-time configuration of a grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    /// Side length of a square cell. Must be finite and strictly positive.
    pub cell_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl GridConfig {
    /// Returns a copy with an unusable cell size replaced by [`DEFAULT_CELL_SIZE`].
    pub(crate) fn sanitized(self) -> Self {
        debug_assert!(
            self.cell_size.is_finite() && self.cell_size > 0.0,
            "grid cell_size must be finite and strictly positive"
        );
        if self.cell_size.is_finite() && self.cell_size > 0.0 {
            self
        } else {
            Self::default()
        }
    }
}
