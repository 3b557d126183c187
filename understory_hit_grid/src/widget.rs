// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What the grid needs to know about widgets, and how it hands them back.
//!
//! The grid never owns widgets. It stores a host-chosen key `K` and resolves
//! everything else through a [`WidgetSource`] at the moment it is needed, so a
//! widget that disappears between frames simply stops resolving.

use alloc::vec::Vec;

use kurbo::Point;

use crate::geometry::Geometry;
use crate::types::WidgetFlags;

/// Read-only view of the host's widget tree.
///
/// Every method takes a key that may be stale. Returning `None` from
/// [`WidgetSource::flags`] marks the widget as gone; the grid then treats
/// any record for it as absent.
pub trait WidgetSource<K> {
    /// Current capability flags, or `None` if `widget` no longer exists.
    fn flags(&self, widget: &K) -> Option<WidgetFlags>;

    /// Current paint-space (window-space) geometry.
    fn paint_geometry(&self, widget: &K) -> Option<Geometry>;

    /// The widget this one is painted under, if any.
    fn paint_parent(&self, widget: &K) -> Option<K>;

    /// Test `window_point` against the widget's active clipping state.
    ///
    /// `None` means the widget has no clipping state and imposes no constraint.
    fn clip_contains(&self, widget: &K, window_point: Point) -> Option<bool> {
        let _ = (widget, window_point);
        None
    }
}

/// A widget paired with the geometry it was hit at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrangedWidget<K> {
    /// The widget key.
    pub widget: K,
    /// Desktop-space geometry.
    pub geometry: Geometry,
}

impl<K> ArrangedWidget<K> {
    /// Pair a widget with its geometry.
    pub const fn new(widget: K, geometry: Geometry) -> Self {
        Self { widget, geometry }
    }
}

/// Extends a bubble path into content the grid cannot see.
///
/// Virtualized lists and embedded scenes register one of these for the widget
/// that hosts them. When that widget wins a hit test, its path is extended with
/// whatever this returns.
pub trait CustomHitTestPath<K> {
    /// Widgets below the host widget at `desktop_point`, root-most first.
    ///
    /// `geometry` is the host widget's desktop-space geometry.
    fn extended_bubble_path(
        &self,
        geometry: &Geometry,
        desktop_point: Point,
        ignore_enabled: bool,
    ) -> Vec<ArrangedWidget<K>>;
}
