// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget geometry: a local rectangle placed in paint space by an affine transform.
//!
//! Hit testing uses the exact transformed rectangle ([`OrientedRect`]) so rotated or
//! sheared widgets are tested precisely, while cell registration uses its conservative
//! axis-aligned bounds.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// A widget's local rectangle `(0, 0)..size` mapped into paint space by `transform`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Local extent.
    pub size: Size,
    /// Local to paint space.
    pub transform: Affine,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            size: Size::ZERO,
            transform: Affine::IDENTITY,
        }
    }
}

impl Geometry {
    /// Create a geometry from a size and a local-to-paint transform.
    #[must_use]
    pub const fn new(size: Size, transform: Affine) -> Self {
        Self { size, transform }
    }

    /// An axis-aligned geometry covering `rect` in paint space.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            size: rect.size(),
            transform: Affine::translate(rect.origin().to_vec2()),
        }
    }

    /// The exact paint-space quadrilateral.
    #[must_use]
    pub fn oriented_rect(&self) -> OrientedRect {
        let origin = self.transform * Point::ORIGIN;
        let extent_x = self.transform * Point::new(self.size.width, 0.0) - origin;
        let extent_y = self.transform * Point::new(0.0, self.size.height) - origin;
        OrientedRect {
            origin,
            extent_x,
            extent_y,
        }
    }

    /// Conservative axis-aligned bounds in paint space.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        self.oriented_rect().bounding_rect()
    }

    /// The same geometry moved by `offset` after its own transform.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            size: self.size,
            transform: Affine::translate(offset) * self.transform,
        }
    }

    /// A child geometry placed at `offset` in this geometry's local space.
    #[must_use]
    pub fn make_child(&self, offset: Vec2, size: Size) -> Self {
        Self {
            size,
            transform: self.transform * Affine::translate(offset),
        }
    }

    /// Map a paint-space point into local space.
    ///
    /// Returns `None` when the transform is singular.
    #[must_use]
    pub fn absolute_to_local(&self, point: Point) -> Option<Point> {
        let det = self.transform.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(self.transform.inverse() * point)
    }
}

/// A parallelogram given by one corner and two edge vectors.
///
/// This is what an axis-aligned rectangle becomes under an affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedRect {
    /// Image of the local top-left corner.
    pub origin: Point,
    /// Image of the local x edge.
    pub extent_x: Vec2,
    /// Image of the local y edge.
    pub extent_y: Vec2,
}

impl OrientedRect {
    /// Corners in winding order, starting at `origin`.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            self.origin,
            self.origin + self.extent_x,
            self.origin + self.extent_x + self.extent_y,
            self.origin + self.extent_y,
        ]
    }

    /// Axis-aligned bounds of the four corners.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let [first, rest @ ..] = self.corners();
        rest.iter()
            .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p))
    }

    /// Edge-inclusive containment.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let det = self.extent_x.cross(self.extent_y);
        if det == 0.0 {
            // Degenerate: a segment or a point. Only points on it count.
            return self.edge_distance_sq(point) == 0.0;
        }
        let d = point - self.origin;
        let s = d.cross(self.extent_y) / det;
        let t = self.extent_x.cross(d) / det;
        (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)
    }

    /// The point of the rectangle nearest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Point) -> Point {
        if self.contains(point) {
            return point;
        }
        let mut best = self.origin;
        let mut best_d2 = f64::INFINITY;
        for (p0, p1) in self.edges() {
            let candidate = closest_on_segment(p0, p1, point);
            let d2 = (candidate - point).hypot2();
            if d2 < best_d2 {
                best_d2 = d2;
                best = candidate;
            }
        }
        best
    }

    /// Squared distance from `point` to the rectangle; zero inside.
    #[must_use]
    pub fn distance_sq(&self, point: Point) -> f64 {
        (self.closest_point(point) - point).hypot2()
    }

    /// Whether a circle touches the rectangle.
    #[must_use]
    pub fn overlaps_circle(&self, center: Point, radius: f64) -> bool {
        self.distance_sq(center) <= radius * radius
    }

    fn edges(&self) -> [(Point, Point); 4] {
        let [a, b, c, d] = self.corners();
        [(a, b), (b, c), (c, d), (d, a)]
    }

    fn edge_distance_sq(&self, point: Point) -> f64 {
        self.edges()
            .into_iter()
            .map(|(p0, p1)| (closest_on_segment(p0, p1, point) - point).hypot2())
            .fold(f64::INFINITY, f64::min)
    }
}

fn closest_on_segment(p0: Point, p1: Point, point: Point) -> Point {
    let v = p1 - p0;
    let len2 = v.hypot2();
    let t = if len2 > 0.0 {
        ((point - p0).dot(v) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    p0 + v * t
}
