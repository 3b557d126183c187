// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bubble paths: the hit widget and its paint ancestors, root first.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use kurbo::Point;
use smallvec::SmallVec;

use crate::compose::{GridId, GridSet};
use crate::types::{UserIndex, WidgetFlags};
use crate::widget::{ArrangedWidget, WidgetSource};

impl<K: Copy + Eq + Hash + Debug> GridSet<K> {
    /// The route an event at `desktop_point` bubbles along, root-most widget first.
    ///
    /// The winner of [`GridSet::hit_test`] is walked up its paint parents to
    /// the nearest window. Chains that never reach a window yield an empty
    /// path. Unless `ignore_enabled` is set the path stops before the first
    /// disabled widget. If nothing was cut and the winner has a live custom
    /// hit-test path, that path's extension is appended.
    ///
    /// Geometry in the returned path is in desktop space.
    pub fn bubble_path<S>(
        &self,
        target: GridId,
        source: &S,
        desktop_point: Point,
        radius: f64,
        ignore_enabled: bool,
        user: UserIndex,
    ) -> Vec<ArrangedWidget<K>>
    where
        S: WidgetSource<K> + ?Sized,
    {
        let Some(hit) = self.hit_test(target, source, desktop_point, radius, user) else {
            return Vec::new();
        };
        let Some(grid) = self.get(hit.grid) else {
            return Vec::new();
        };
        let to_desktop = grid.window_to_desktop();

        let mut path = Vec::new();
        let mut enabled: SmallVec<[bool; 16]> = SmallVec::new();
        let mut rooted = false;
        let mut current = Some(hit.widget);
        while let Some(widget) = current {
            let (Some(flags), Some(geometry)) =
                (source.flags(&widget), source.paint_geometry(&widget))
            else {
                break;
            };
            path.push(ArrangedWidget::new(widget, geometry.translated(to_desktop)));
            enabled.push(flags.contains(WidgetFlags::ENABLED));
            if flags.contains(WidgetFlags::WINDOW) {
                rooted = true;
                break;
            }
            current = source.paint_parent(&widget);
        }
        if !rooted {
            tracing::trace!(widget = ?hit.widget, "hit widget is not under a window");
            return Vec::new();
        }

        path.reverse();
        enabled.reverse();
        if !ignore_enabled {
            if let Some(cut) = enabled.iter().position(|e| !e) {
                path.truncate(cut);
                return path;
            }
        }

        let extension = grid
            .record(hit.record)
            .and_then(|record| record.custom_path())
            .zip(path.last())
            .map(|(custom, last)| {
                custom.extended_bubble_path(&last.geometry, desktop_point, ignore_enabled)
            });
        if let Some(extension) = extension {
            path.extend(extension);
        }
        path
    }
}
