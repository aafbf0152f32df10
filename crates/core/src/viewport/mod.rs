use crate::{Breakpoints, GapPolicy};

impl Breakpoints {
    /// Number of items shown side by side at the given viewport width.
    pub fn items_per_view(&self, viewport_width: f32) -> usize {
        if viewport_width < self.tablet_px {
            1
        } else if viewport_width < self.desktop_px {
            2
        } else {
            3
        }
    }
}

impl GapPolicy {
    /// Horizontal gap between consecutive items at the given viewport width.
    pub fn gap_for(&self, viewport_width: f32) -> f32 {
        if viewport_width >= self.wide_from_px {
            self.wide_px
        } else {
            self.compact_px
        }
    }
}
