// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directional focus navigation over a keypad laid out in a hit-test grid.
//!
//! Run:
//! - `RUST_LOG=understory_hit_grid=trace cargo run -p understory_demos --example focus_navigation`

use kurbo::{Point, Rect, Size};
use understory_hit_grid::{
    Direction, Geometry, GridSet, HitTestGrid, NavigationReply, UserIndex, WidgetFlags, WidgetSort,
    WidgetSource,
};

const COLUMNS: usize = 3;
const ROWS: usize = 4;
const KEY: f64 = 80.0;
const GAP: f64 = 16.0;

/// Widget 0 is the window; keys follow in row-major order.
struct Keypad {
    keys: Vec<Rect>,
    window: Rect,
}

impl Keypad {
    fn new() -> Self {
        let keys = (0..ROWS * COLUMNS)
            .map(|i| {
                let (col, row) = ((i % COLUMNS) as f64, (i / COLUMNS) as f64);
                let x = GAP + col * (KEY + GAP);
                let y = GAP + row * (KEY + GAP);
                Rect::new(x, y, x + KEY, y + KEY)
            })
            .collect();
        Self {
            keys,
            window: Rect::new(0.0, 0.0, 320.0, 400.0),
        }
    }

    fn label(&self, widget: usize) -> &'static str {
        const LABELS: [&str; ROWS * COLUMNS] =
            ["1", "2", "3", "4", "5", "6", "7", "8", "9", "*", "0", "#"];
        widget
            .checked_sub(1)
            .and_then(|i| LABELS.get(i))
            .copied()
            .unwrap_or("-")
    }
}

impl WidgetSource<usize> for Keypad {
    fn flags(&self, widget: &usize) -> Option<WidgetFlags> {
        match *widget {
            0 => Some(WidgetFlags::default() | WidgetFlags::WINDOW),
            w if w <= self.keys.len() => Some(WidgetFlags::default() | WidgetFlags::FOCUSABLE),
            _ => None,
        }
    }

    fn paint_geometry(&self, widget: &usize) -> Option<Geometry> {
        match *widget {
            0 => Some(Geometry::from_rect(self.window)),
            w => self.keys.get(w - 1).copied().map(Geometry::from_rect),
        }
    }

    fn paint_parent(&self, widget: &usize) -> Option<usize> {
        (*widget != 0).then_some(0)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let keypad = Keypad::new();
    let mut grid = HitTestGrid::new();
    grid.set_area(Point::ORIGIN, Point::ORIGIN, Size::new(320.0, 400.0));
    for widget in 1..=keypad.keys.len() {
        grid.add_widget(&keypad, widget, WidgetSort::default());
    }
    let mut grids = GridSet::new();
    let id = grids.insert(grid);

    let moves = [
        Direction::Right,
        Direction::Right,
        Direction::Right,
        Direction::Down,
        Direction::Down,
        Direction::Left,
        Direction::Down,
        Direction::Down,
    ];
    for (name, reply) in [
        ("stop", NavigationReply::stop()),
        ("wrap", NavigationReply::wrap()),
    ] {
        let mut focus = 1;
        let mut trail = vec![keypad.label(focus)];
        for direction in moves {
            if let Some(next) = grids.find_next_focusable_widget(
                id,
                &keypad,
                focus,
                direction,
                &reply,
                0,
                UserIndex::Any,
            ) {
                focus = next;
            }
            trail.push(keypad.label(focus));
        }
        println!("{name:>5}: {}", trail.join(" -> "));
    }
}
