// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click-clips: regions of a widget that let pointer hits fall through.
//!
//! A widget may register several clip regions, each with its own pass-through
//! predicate. At a given point, a widget is *clicked through* only when at
//! least one of its regions contains the point and every region containing the
//! point passes it through. A single opaque region restores the normal hit.
//!
//! Regions are tested in normalized UV space: `(0, 0)` is the region's local
//! top-left corner, `(1, 1)` its bottom-right.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;

use crate::error::GridError;
use crate::geometry::Geometry;

/// Upper bound on the mask clips a single masked widget registers.
pub const MAX_MASK_CLIPS: usize = 3;

/// Pass-through predicate signature: `(uv, clip_index) -> passes`.
pub type PassThroughFn = dyn Fn(Point, u32) -> bool;

/// A single-channel coverage bitmap.
///
/// A texel whose value is above zero lets hits through.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelMask {
    width: u32,
    height: u32,
    red: Vec<u8>,
}

impl Debug for PixelMask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PixelMask {
    /// Build a mask from one byte per texel, row-major.
    pub fn new(width: u32, height: u32, red: Vec<u8>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        if red.len() != expected {
            return Err(GridError::MaskSize {
                expected,
                actual: red.len(),
            });
        }
        Ok(Self { width, height, red })
    }

    /// Build a mask from RGBA8 texels, keeping the red channel.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self, GridError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(GridError::MaskSize {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            red: rgba.chunks_exact(4).map(|texel| texel[0]).collect(),
        })
    }

    /// Width in texels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample at `uv`. Coordinates outside `[0, 1]` never pass.
    #[must_use]
    pub fn passes(&self, uv: Point) -> bool {
        if !in_unit_square(uv) || self.width == 0 || self.height == 0 {
            return false;
        }
        let col = texel(uv.x, self.width);
        let row = texel(uv.y, self.height);
        self.red
            .get(row * self.width as usize + col)
            .is_some_and(|&r| r > 0)
    }
}

/// Texel index for a unit coordinate; `1.0` maps to the last texel.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The coordinate is in [0, 1], so the floored product fits the texel range."
)]
fn texel(t: f64, extent: u32) -> usize {
    ((t * f64::from(extent)).floor() as usize).min(extent as usize - 1)
}

fn in_unit_square(uv: Point) -> bool {
    (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)
}

/// Where a clip region sits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipRegion {
    /// An axis-aligned window-space rectangle.
    Rect(Rect),
    /// A transformed window-space geometry.
    Geometry(Geometry),
}

impl ClipRegion {
    /// Normalized coordinates of a window-space point, or `None` for a degenerate region.
    #[must_use]
    pub fn uv(&self, window_point: Point) -> Option<Point> {
        let (local, size) = match self {
            Self::Rect(rect) => {
                let rect = rect.abs();
                (window_point - rect.origin().to_vec2(), rect.size())
            }
            Self::Geometry(geometry) => (geometry.absolute_to_local(window_point)?, geometry.size),
        };
        if size.width <= 0.0 || size.height <= 0.0 {
            return None;
        }
        Some(Point::new(local.x / size.width, local.y / size.height))
    }
}

/// Decides whether a point inside a clip region passes through.
#[derive(Clone)]
pub enum PassThrough {
    /// Every point passes.
    Transparent,
    /// No point passes.
    Opaque,
    /// Points inside the circle inscribed in the unit square pass.
    ///
    /// This is what masked widgets fall back to when no bitmap is available.
    InscribedCircle,
    /// Sample a bitmap.
    Mask(Rc<PixelMask>),
    /// Host-supplied predicate.
    Predicate(Rc<PassThroughFn>),
}

impl Debug for PassThrough {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transparent => f.write_str("Transparent"),
            Self::Opaque => f.write_str("Opaque"),
            Self::InscribedCircle => f.write_str("InscribedCircle"),
            Self::Mask(mask) => f.debug_tuple("Mask").field(mask).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl PassThrough {
    /// Evaluate at `uv` for the clip with index `clip_index`.
    #[must_use]
    pub fn passes(&self, uv: Point, clip_index: u32) -> bool {
        match self {
            Self::Transparent => true,
            Self::Opaque => false,
            Self::InscribedCircle => (uv - Point::new(0.5, 0.5)).hypot2() < 0.25,
            Self::Mask(mask) => mask.passes(uv),
            Self::Predicate(predicate) => predicate(uv, clip_index),
        }
    }
}

/// One registered clip region.
#[derive(Clone, Debug)]
pub struct ClickClip {
    /// Index the owner assigned to this clip; passed to predicates.
    pub index: u32,
    /// Region in window space.
    pub region: ClipRegion,
    /// Pass-through decision for points inside the region.
    pub pass_through: PassThrough,
}

impl ClickClip {
    /// Create a clip.
    #[must_use]
    pub fn new(index: u32, region: ClipRegion, pass_through: PassThrough) -> Self {
        Self {
            index,
            region,
            pass_through,
        }
    }

    /// Whether `window_point` lies inside the region (edges included).
    #[must_use]
    pub fn contains(&self, window_point: Point) -> bool {
        self.region.uv(window_point).is_some_and(in_unit_square)
    }

    /// Whether `window_point` lies inside the region and passes through it.
    #[must_use]
    pub fn is_click_through(&self, window_point: Point) -> bool {
        self.region
            .uv(window_point)
            .filter(|&uv| in_unit_square(uv))
            .is_some_and(|uv| self.pass_through.passes(uv, self.index))
    }
}

/// A mask clip as declared on a masked widget.
#[derive(Clone, Debug)]
pub struct MaskClip {
    /// Offset inside the widget, in its local space.
    pub position: Vec2,
    /// Extent in the widget's local space.
    pub size: Size,
    /// Coverage bitmap; without one the inscribed circle is used.
    pub mask: Option<Rc<PixelMask>>,
    /// Disabled clips are not registered.
    pub enabled: bool,
}

impl MaskClip {
    /// An enabled clip without a bitmap.
    #[must_use]
    pub fn new(position: Vec2, size: Size) -> Self {
        Self {
            position,
            size,
            mask: None,
            enabled: true,
        }
    }

    /// Attach a coverage bitmap.
    #[must_use]
    pub fn with_mask(mut self, mask: Rc<PixelMask>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// The clip registered for this declaration when painted at `geometry`.
    pub(crate) fn to_click_clip(&self, index: u32, geometry: &Geometry) -> ClickClip {
        let pass_through = match &self.mask {
            Some(mask) => PassThrough::Mask(Rc::clone(mask)),
            None => PassThrough::InscribedCircle,
        };
        ClickClip::new(
            index,
            ClipRegion::Geometry(geometry.make_child(self.position, self.size)),
            pass_through,
        )
    }
}

/// Per-widget click-clip regions.
pub(crate) struct ClickClipRegistry<K> {
    clips: HashMap<K, SmallVec<[ClickClip; MAX_MASK_CLIPS]>>,
}

impl<K: Debug> Debug for ClickClipRegistry<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.clips.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

impl<K: Copy + Eq + Hash> ClickClipRegistry<K> {
    pub(crate) fn new() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }

    pub(crate) fn add(&mut self, widget: K, clip: ClickClip) {
        self.clips.entry(widget).or_default().push(clip);
    }

    pub(crate) fn clear_widget(&mut self, widget: &K) {
        self.clips.remove(widget);
    }

    pub(crate) fn clear(&mut self) {
        self.clips.clear();
    }

    pub(crate) fn clips(&self, widget: &K) -> &[ClickClip] {
        self.clips.get(widget).map(|c| c.as_slice()).unwrap_or_default()
    }

    /// Replace a widget's clips with its enabled mask clips.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "At most MAX_MASK_CLIPS indices are produced."
    )]
    pub(crate) fn register_mask_clips(&mut self, widget: K, geometry: &Geometry, clips: &[MaskClip]) {
        self.clear_widget(&widget);
        for (index, clip) in clips.iter().take(MAX_MASK_CLIPS).enumerate() {
            if clip.enabled {
                self.add(widget, clip.to_click_clip(index as u32, geometry));
            }
        }
    }

    /// Whether hits on `widget` at `window_point` fall through.
    pub(crate) fn is_click_through(&self, widget: &K, window_point: Point) -> bool {
        let mut hit = 0_usize;
        let mut through = 0_usize;
        for clip in self.clips(widget) {
            if clip.contains(window_point) {
                hit += 1;
                if clip.is_click_through(window_point) {
                    through += 1;
                }
            }
        }
        hit > 0 && hit == through
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn no_clips_never_click_through() {
        let registry = ClickClipRegistry::<u32>::new();
        assert!(!registry.is_click_through(&1, Point::new(5.0, 5.0)));
    }

    #[test]
    fn opaque_region_overrides_transparent_one() {
        let mut registry = ClickClipRegistry::new();
        let region = ClipRegion::Rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        registry.add(1_u32, ClickClip::new(0, region, PassThrough::Transparent));
        assert!(registry.is_click_through(&1, Point::new(5.0, 5.0)));
        // Outside every region: a normal hit.
        assert!(!registry.is_click_through(&1, Point::new(50.0, 5.0)));

        let opaque = ClipRegion::Rect(Rect::new(4.0, 4.0, 6.0, 6.0));
        registry.add(1, ClickClip::new(1, opaque, PassThrough::Opaque));
        assert!(!registry.is_click_through(&1, Point::new(5.0, 5.0)));
        assert!(registry.is_click_through(&1, Point::new(1.0, 1.0)));
    }

    #[test]
    fn inscribed_circle_passes_center_not_corners() {
        let clip = ClickClip::new(
            0,
            ClipRegion::Rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
            PassThrough::InscribedCircle,
        );
        assert!(clip.is_click_through(Point::new(50.0, 50.0)));
        assert!(clip.contains(Point::new(2.0, 2.0)));
        assert!(!clip.is_click_through(Point::new(2.0, 2.0)));
    }

    #[test]
    fn pixel_mask_samples_red_channel() {
        // 2x2: only the bottom-right texel is set.
        let rgba = [
            0, 0, 0, 255, //
            0, 9, 9, 255, //
            0, 0, 0, 255, //
            200, 0, 0, 255,
        ];
        let mask = PixelMask::from_rgba8(2, 2, &rgba).unwrap();
        assert!(!mask.passes(Point::new(0.75, 0.25)));
        assert!(mask.passes(Point::new(0.75, 0.75)));
        assert!(mask.passes(Point::new(1.0, 1.0)));
        assert!(!mask.passes(Point::new(1.5, 0.75)));

        assert_eq!(
            PixelMask::new(2, 2, vec![0; 3]),
            Err(GridError::MaskSize {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn predicate_receives_uv_and_index() {
        let predicate: Rc<PassThroughFn> = Rc::new(|uv: Point, index: u32| index == 7 && uv.x < 0.5);
        let clip = ClickClip::new(
            7,
            ClipRegion::Rect(Rect::new(10.0, 0.0, 30.0, 10.0)),
            PassThrough::Predicate(predicate),
        );
        assert!(clip.is_click_through(Point::new(15.0, 5.0)));
        assert!(!clip.is_click_through(Point::new(25.0, 5.0)));
    }

    #[test]
    fn mask_clips_register_enabled_entries_only() {
        let mut registry = ClickClipRegistry::new();
        let geometry = Geometry::from_rect(Rect::new(100.0, 100.0, 200.0, 200.0));
        let mut disabled = MaskClip::new(Vec2::new(50.0, 0.0), Size::new(50.0, 50.0));
        disabled.enabled = false;
        let clips = [
            MaskClip::new(Vec2::ZERO, Size::new(50.0, 50.0)),
            disabled,
            MaskClip::new(Vec2::new(0.0, 50.0), Size::new(50.0, 50.0)),
            MaskClip::new(Vec2::new(50.0, 50.0), Size::new(50.0, 50.0)),
        ];
        registry.register_mask_clips(9_u32, &geometry, &clips);
        let registered = registry.clips(&9);
        assert_eq!(registered.len(), 2);
        assert_eq!(registered[0].index, 0);
        assert_eq!(registered[1].index, 2);
        // Center of the first clip, in window space.
        assert!(registry.is_click_through(&9, Point::new(125.0, 125.0)));

        // Re-registering replaces instead of accumulating.
        registry.register_mask_clips(9, &geometry, &clips[..1]);
        assert_eq!(registry.clips(&9).len(), 1);
    }
}
