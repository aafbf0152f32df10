//! Live layout measurement.
//!
//! Slide width is always read from the rendered strip, never from a nominal
//! style width, because the real width depends on the viewport and on the
//! content of each item.

use crate::{CarouselError, GapPolicy, Result};

/// Read-only view of the rendered strip.
pub trait Layout {
    fn viewport_width(&self) -> f32;

    /// On-screen width of the rendered slot, if it exists.
    fn item_width(&self, slot: usize) -> Option<f32>;

    /// Left edge of the rendered slot relative to the strip's origin.
    fn item_left(&self, slot: usize) -> Option<f32>;
}

/// How the distance between consecutive slots is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlideMeasure {
    /// Width of slot 0 plus the viewport-dependent gap.
    WidthPlusGap(GapPolicy),
    /// Distance between the left edges of slots 0 and 1. Falls back to the
    /// width of slot 0 when only one slot is rendered.
    EdgePitch,
}

/// Measured strip geometry. A new value is produced on every measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Distance between the left edges of two consecutive slots, gap included.
    pub slide_width_px: f32,
    /// Width of one full copy of the item list.
    pub total_width_px: f32,
}

impl Geometry {
    /// Pixel offset of a slot when it sits at the strip's left edge.
    pub fn offset_of(&self, slot: usize) -> f32 {
        -(slot as f32) * self.slide_width_px
    }
}

/// Measures the strip. Returns [`CarouselError::GeometryNotReady`] when the
/// layout has not produced a usable width yet; callers decide whether to retry.
pub fn remeasure(
    layout: &dyn Layout,
    item_count: usize,
    measure: SlideMeasure,
) -> Result<Geometry> {
    if item_count == 0 {
        return Err(CarouselError::EmptyItemList);
    }

    let slide = match measure {
        SlideMeasure::WidthPlusGap(gap) => layout
            .item_width(0)
            .filter(|w| usable(*w))
            .map(|w| w + gap.gap_for(layout.viewport_width())),
        SlideMeasure::EdgePitch => {
            let first = layout.item_width(0).filter(|w| usable(*w));
            match (first, layout.item_left(0), layout.item_left(1)) {
                (Some(_), Some(a), Some(b)) => Some(b - a),
                (Some(w), _, _) => Some(w),
                _ => None,
            }
        }
    };

    match slide {
        Some(slide_width_px) if usable(slide_width_px) => Ok(Geometry {
            slide_width_px,
            total_width_px: slide_width_px * item_count as f32,
        }),
        _ => Err(CarouselError::GeometryNotReady { attempts: 1 }),
    }
}

fn usable(width: f32) -> bool {
    width.is_finite() && width > 0.0
}

/// A strip of identical slots laid out left to right with a fixed gap.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLayout {
    pub viewport_width: f32,
    pub item_width: f32,
    pub gap: f32,
    pub slots: usize,
}

impl StaticLayout {
    pub fn new(viewport_width: f32, item_width: f32, gap: f32, slots: usize) -> Self {
        Self {
            viewport_width,
            item_width,
            gap,
            slots,
        }
    }

    /// Layout whose slots have not been sized yet.
    pub fn unmeasured(viewport_width: f32, slots: usize) -> Self {
        Self::new(viewport_width, 0.0, 0.0, slots)
    }

    pub fn resize(&mut self, viewport_width: f32, item_width: f32) {
        self.viewport_width = viewport_width;
        self.item_width = item_width;
    }
}

impl Layout for StaticLayout {
    fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    fn item_width(&self, slot: usize) -> Option<f32> {
        (slot < self.slots).then_some(self.item_width)
    }

    fn item_left(&self, slot: usize) -> Option<f32> {
        (slot < self.slots).then(|| slot as f32 * (self.item_width + self.gap))
    }
}
