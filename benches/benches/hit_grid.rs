// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for hit-grid rebuilds, point queries, and focus search.
//!
//! The synthetic scene is a window filled with rows of list items, each holding
//! a label and a couple of buttons, which approximates a settings page.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Size};
use understory_hit_grid::{
    Direction, Geometry, GridSet, HitTestGrid, NavigationReply, UserIndex, WidgetFlags, WidgetSort,
    WidgetSource,
};

const WINDOW: Size = Size::new(1920.0, 1080.0);

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1_u64 << 53) as f64
    }
}

struct Node {
    rect: Rect,
    parent: Option<u32>,
    flags: WidgetFlags,
}

struct Scene {
    nodes: Vec<Node>,
}

impl Scene {
    fn build(rows: u32) -> Self {
        let mut nodes = vec![Node {
            rect: WINDOW.to_rect(),
            parent: None,
            flags: WidgetFlags::default() | WidgetFlags::WINDOW,
        }];
        let interactive =
            WidgetFlags::default() | WidgetFlags::INTERACTABLE | WidgetFlags::FOCUSABLE;
        let row_height = WINDOW.height / f64::from(rows);
        for r in 0..rows {
            let y = f64::from(r) * row_height;
            let row_id = nodes.len() as u32;
            nodes.push(Node {
                rect: Rect::new(0.0, y, WINDOW.width, y + row_height),
                parent: Some(0),
                flags: WidgetFlags::default(),
            });
            nodes.push(Node {
                rect: Rect::new(16.0, y + 2.0, 600.0, y + row_height - 2.0),
                parent: Some(row_id),
                flags: WidgetFlags::default(),
            });
            for b in 0..2 {
                let x = WINDOW.width - 240.0 + f64::from(b) * 112.0;
                nodes.push(Node {
                    rect: Rect::new(x, y + 2.0, x + 100.0, y + row_height - 2.0),
                    parent: Some(row_id),
                    flags: interactive,
                });
            }
        }
        Self { nodes }
    }

    fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.nodes.len()).map(|i| i as u32)
    }
}

impl WidgetSource<u32> for Scene {
    fn flags(&self, widget: &u32) -> Option<WidgetFlags> {
        self.nodes.get(*widget as usize).map(|n| n.flags)
    }

    fn paint_geometry(&self, widget: &u32) -> Option<Geometry> {
        self.nodes
            .get(*widget as usize)
            .map(|n| Geometry::from_rect(n.rect))
    }

    fn paint_parent(&self, widget: &u32) -> Option<u32> {
        self.nodes.get(*widget as usize).and_then(|n| n.parent)
    }
}

fn build_grid(scene: &Scene) -> HitTestGrid<u32> {
    let mut grid = HitTestGrid::new();
    grid.set_area(Point::ORIGIN, Point::ORIGIN, WINDOW);
    for (layer, id) in scene.ids().enumerate() {
        grid.add_widget(scene, id, WidgetSort::layer(layer as i32));
    }
    grid
}

fn hit_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_hit_grid");
    group.sample_size(50);

    for &rows in &[16_u32, 64, 256] {
        let scene = Scene::build(rows);

        group.bench_with_input(BenchmarkId::new("rebuild", rows), &scene, |b, scene| {
            b.iter(|| black_box(build_grid(scene)));
        });

        let mut grids = GridSet::new();
        let id = grids.insert(build_grid(&scene));
        let mut rng = Lcg(0x5EED_0000_0000_0001);
        let points: Vec<Point> = (0..1024)
            .map(|_| Point::new(rng.next_f64() * WINDOW.width, rng.next_f64() * WINDOW.height))
            .collect();

        group.bench_function(BenchmarkId::new("hit_test", rows), |b| {
            b.iter(|| {
                for &pt in &points {
                    black_box(grids.hit_test(id, &scene, pt, 0.0, UserIndex::Any));
                }
            });
        });

        group.bench_function(BenchmarkId::new("hit_test_radius", rows), |b| {
            b.iter(|| {
                for &pt in &points {
                    black_box(grids.hit_test(id, &scene, pt, 24.0, UserIndex::Any));
                }
            });
        });

        group.bench_function(BenchmarkId::new("bubble_path", rows), |b| {
            b.iter_batched(
                || points[..64].to_vec(),
                |pts| {
                    for pt in pts {
                        black_box(grids.bubble_path(id, &scene, pt, 0.0, false, UserIndex::Any));
                    }
                },
                BatchSize::SmallInput,
            );
        });

        // First button of the first row, walking down the column.
        let start = 3;
        group.bench_function(BenchmarkId::new("focus_down", rows), |b| {
            b.iter(|| {
                black_box(grids.find_next_focusable_widget(
                    id,
                    &scene,
                    start,
                    Direction::Down,
                    &NavigationReply::wrap(),
                    0,
                    UserIndex::Any,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, hit_grid);
criterion_main!(benches);
