// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point queries, bubble paths, click-clips, and grid composition.
//!
//! A window holds a toolbar with a porthole, a widget with a round see-through
//! opening, and a viewport whose embedded scene has its own grid composed into
//! the window's grid.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_demos --example hit_grid_routing`

use std::collections::HashMap;

use kurbo::{Point, Rect, Size};
use understory_hit_grid::{
    ClickClip, ClipRegion, Geometry, GridSet, HitTestGrid, PassThrough, UserIndex, WidgetFlags,
    WidgetSort, WidgetSource,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Id {
    Window,
    Toolbar,
    Porthole,
    Viewport,
    SceneItem,
}

struct Widget {
    rect: Rect,
    parent: Option<Id>,
    flags: WidgetFlags,
}

struct Scene(HashMap<Id, Widget>);

impl WidgetSource<Id> for Scene {
    fn flags(&self, widget: &Id) -> Option<WidgetFlags> {
        self.0.get(widget).map(|w| w.flags)
    }

    fn paint_geometry(&self, widget: &Id) -> Option<Geometry> {
        self.0.get(widget).map(|w| Geometry::from_rect(w.rect))
    }

    fn paint_parent(&self, widget: &Id) -> Option<Id> {
        self.0.get(widget).and_then(|w| w.parent)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let interactive = WidgetFlags::default() | WidgetFlags::INTERACTABLE;
    let scene = Scene(HashMap::from([
        (
            Id::Window,
            Widget {
                rect: Rect::new(0.0, 0.0, 640.0, 480.0),
                parent: None,
                flags: WidgetFlags::default() | WidgetFlags::WINDOW,
            },
        ),
        (
            Id::Toolbar,
            Widget {
                rect: Rect::new(0.0, 0.0, 640.0, 48.0),
                parent: Some(Id::Window),
                flags: interactive,
            },
        ),
        (
            Id::Porthole,
            Widget {
                rect: Rect::new(8.0, 8.0, 40.0, 40.0),
                parent: Some(Id::Toolbar),
                flags: interactive,
            },
        ),
        (
            Id::Viewport,
            Widget {
                rect: Rect::new(0.0, 48.0, 640.0, 480.0),
                parent: Some(Id::Window),
                flags: interactive,
            },
        ),
        (
            Id::SceneItem,
            Widget {
                rect: Rect::new(300.0, 200.0, 360.0, 260.0),
                parent: Some(Id::Viewport),
                flags: interactive,
            },
        ),
    ]));

    // The window sits at (100, 50) on the desktop.
    let origin = Point::new(100.0, 50.0);
    let size = Size::new(640.0, 480.0);
    let mut grids = GridSet::new();

    let mut window_grid = HitTestGrid::new();
    window_grid.set_area(origin, Point::ORIGIN, size);
    for (layer, id) in [Id::Window, Id::Toolbar, Id::Porthole, Id::Viewport]
        .into_iter()
        .enumerate()
    {
        let layer = i32::try_from(layer).unwrap_or(i32::MAX);
        window_grid.add_widget(&scene, id, WidgetSort::layer(layer));
    }
    // Clicks inside the porthole's round opening reach the toolbar behind it.
    window_grid.add_click_clip(
        Id::Porthole,
        ClickClip::new(
            0,
            ClipRegion::Rect(Rect::new(8.0, 8.0, 40.0, 40.0)),
            PassThrough::InscribedCircle,
        ),
    );
    let window = grids.insert(window_grid);

    let mut viewport_grid = HitTestGrid::new();
    viewport_grid.set_area(origin, Point::ORIGIN, size);
    viewport_grid.set_owner(Some(Id::Viewport));
    viewport_grid.add_widget(&scene, Id::SceneItem, WidgetSort::new(1, 0, 0));
    let viewport = grids.insert(viewport_grid);

    if let Err(err) = grids.add_grid(window, viewport) {
        tracing::error!(%err, "could not compose the viewport grid");
        return;
    }

    for (label, local) in [
        ("porthole center", Point::new(24.0, 24.0)),
        ("porthole rim", Point::new(9.0, 9.0)),
        ("scene item", Point::new(330.0, 230.0)),
        ("empty viewport", Point::new(500.0, 400.0)),
    ] {
        let at = origin + local.to_vec2();
        let path = grids.bubble_path(window, &scene, at, 0.0, false, UserIndex::Any);
        let route: Vec<Id> = path.iter().map(|a| a.widget).collect();
        println!("{label:>15} @ {at:?}: {route:?}");
    }
}
