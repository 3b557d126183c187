// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small widget arena for unit tests.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};

use crate::geometry::Geometry;
use crate::types::WidgetFlags;
use crate::widget::WidgetSource;

#[derive(Clone, Debug)]
struct Node {
    flags: WidgetFlags,
    geometry: Geometry,
    parent: Option<u32>,
    clip: Option<Rect>,
    alive: bool,
}

/// Widgets keyed by index. Widget 0 is a window covering `size`.
#[derive(Clone, Debug)]
pub(crate) struct TestHost {
    pub(crate) size: Size,
    nodes: Vec<Node>,
}

impl TestHost {
    pub(crate) const ROOT: u32 = 0;

    pub(crate) fn new(size: Size) -> Self {
        let root = Node {
            flags: WidgetFlags::HIT_TEST_VISIBLE | WidgetFlags::ENABLED | WidgetFlags::WINDOW,
            geometry: Geometry::from_rect(size.to_rect()),
            parent: None,
            clip: None,
            alive: true,
        };
        Self {
            size,
            nodes: alloc::vec![root],
        }
    }

    /// Interactive, focusable child of the root.
    pub(crate) fn leaf(&mut self, rect: Rect) -> u32 {
        self.child(Self::ROOT, rect)
    }

    /// Interactive, focusable child of `parent`.
    pub(crate) fn child(&mut self, parent: u32, rect: Rect) -> u32 {
        self.nodes.push(Node {
            flags: WidgetFlags::HIT_TEST_VISIBLE
                | WidgetFlags::ENABLED
                | WidgetFlags::INTERACTABLE
                | WidgetFlags::FOCUSABLE,
            geometry: Geometry::from_rect(rect),
            parent: Some(parent),
            clip: None,
            alive: true,
        });
        u32::try_from(self.nodes.len() - 1).unwrap()
    }

    fn node_mut(&mut self, id: u32) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.get(id as usize).filter(|n| n.alive)
    }

    pub(crate) fn set_flags(&mut self, id: u32, flags: WidgetFlags) {
        self.node_mut(id).flags = flags;
    }

    pub(crate) fn move_to(&mut self, id: u32, rect: Rect) {
        self.node_mut(id).geometry = Geometry::from_rect(rect);
    }

    pub(crate) fn set_geometry(&mut self, id: u32, geometry: Geometry) {
        self.node_mut(id).geometry = geometry;
    }

    pub(crate) fn set_parent(&mut self, id: u32, parent: Option<u32>) {
        self.node_mut(id).parent = parent;
    }

    pub(crate) fn set_clip(&mut self, id: u32, clip: Rect) {
        self.node_mut(id).clip = Some(clip);
    }

    pub(crate) fn destroy(&mut self, id: u32) {
        self.node_mut(id).alive = false;
    }
}

impl WidgetSource<u32> for TestHost {
    fn flags(&self, widget: &u32) -> Option<WidgetFlags> {
        self.node(*widget).map(|n| n.flags)
    }

    fn paint_geometry(&self, widget: &u32) -> Option<Geometry> {
        self.node(*widget).map(|n| n.geometry)
    }

    fn paint_parent(&self, widget: &u32) -> Option<u32> {
        self.node(*widget).and_then(|n| n.parent)
    }

    fn clip_contains(&self, widget: &u32, window_point: Point) -> Option<bool> {
        let clip = self.node(*widget)?.clip?;
        Some(clip.contains(window_point))
    }
}
