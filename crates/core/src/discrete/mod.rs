//! Slide-by-slide carousel.
//!
//! The strip renders the item list at least three times and rests in the
//! middle copy, slots `N..2N`. Advancing past the last middle slot animates
//! into the first slot of the third copy (slot `2N`), and only once that
//! transition has completed does the strip snap back to slot `N`, which shows
//! the same content. Pausing drops any partial interval; leaving the strip
//! restarts the advance timer from zero.

use tracing::{debug, info, trace, warn};

use crate::{
    carousel::{cancel_slot, measure_or_retry, Carousel, Measured},
    easing::Tween,
    layout::{remeasure, Geometry, Layout, SlideMeasure},
    Breakpoints, CarouselError, DiscreteConfig, Fired, Result, Scheduler, TaskHandle,
};

/// Observable state of the slide strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscreteState {
    /// Not mounted yet, torn down, or gave up waiting for the layout.
    Unmounted,
    /// Waiting for the layout to report a usable width.
    Measuring { attempts: u32 },
    Idle,
    Animating,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mount {
    Unmounted,
    Measuring { attempts: u32 },
    Mounted,
}

#[derive(Debug, Clone)]
pub struct DiscreteCarousel {
    item_count: usize,
    config: DiscreteConfig,
    breakpoints: Breakpoints,
    mount: Mount,
    paused: bool,
    geometry: Option<Geometry>,
    items_per_view: usize,
    /// Slot at the strip's left edge. Equals `2N` only while the wrapping
    /// transition is still in flight.
    slot: usize,
    position_px: f32,
    transition: Option<Tween>,
    timer: Option<TaskHandle>,
    frame: Option<TaskHandle>,
    retry: Option<TaskHandle>,
}

impl DiscreteCarousel {
    pub fn new(
        item_count: usize,
        config: DiscreteConfig,
        breakpoints: Breakpoints,
    ) -> Result<Self> {
        if item_count == 0 {
            return Err(CarouselError::EmptyItemList);
        }
        config.validate()?;

        Ok(Self {
            item_count,
            config,
            breakpoints,
            mount: Mount::Unmounted,
            paused: false,
            geometry: None,
            items_per_view: 1,
            slot: item_count,
            position_px: 0.0,
            transition: None,
            timer: None,
            frame: None,
            retry: None,
        })
    }

    /// Current index into the render list, always inside the middle copy.
    pub fn current_index(&self) -> usize {
        if self.slot >= self.boundary() {
            self.slot - self.item_count
        } else {
            self.slot
        }
    }

    /// Index of the item at the left edge within the original list.
    pub fn logical_index(&self) -> usize {
        self.current_index() % self.item_count
    }

    pub fn state(&self) -> DiscreteState {
        if let Mount::Measuring { attempts } = self.mount {
            DiscreteState::Measuring { attempts }
        } else if self.mount == Mount::Unmounted {
            DiscreteState::Unmounted
        } else if self.paused {
            DiscreteState::Paused
        } else if self.transition.is_some() {
            DiscreteState::Animating
        } else {
            DiscreteState::Idle
        }
    }

    /// Whether the pointer is over the strip. Tracked before mounting too.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn items_per_view(&self) -> usize {
        self.items_per_view
    }

    pub fn is_mounted(&self) -> bool {
        self.mount == Mount::Mounted
    }

    /// Steps one slide forward and returns the new current index. When the
    /// step leaves the middle copy the index re-enters it at `N`.
    pub fn advance(&mut self, sched: &mut dyn Scheduler) -> usize {
        self.settle_boundary();
        self.slot += 1;
        self.animate_to_slot(sched);
        debug!(index = self.current_index(), "discrete carousel advanced");
        self.current_index()
    }

    /// Jumps to a logical item, clamped so the last page stays full, and
    /// restarts the advance timer. Returns the clamped logical index.
    pub fn go_to(&mut self, logical: usize, sched: &mut dyn Scheduler) -> usize {
        let max = self.item_count.saturating_sub(self.items_per_view);
        let target = logical.min(max);

        self.settle_boundary();
        self.slot = self.item_count + target;
        self.restart_timer(sched);
        self.animate_to_slot(sched);
        debug!(target, "discrete carousel navigated");
        target
    }

    fn boundary(&self) -> usize {
        self.item_count * 2
    }

    fn measure(&self) -> SlideMeasure {
        SlideMeasure::EdgePitch
    }

    fn try_measure(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        let previous = match self.mount {
            Mount::Measuring { attempts } => attempts,
            _ => 0,
        };

        let measured = measure_or_retry(
            layout,
            self.item_count,
            self.measure(),
            self.config.retry,
            previous,
            sched,
        );
        match measured {
            Ok(Measured::Ready(geometry)) => {
                self.geometry = Some(geometry);
                self.items_per_view = self.breakpoints.items_per_view(layout.viewport_width());
                self.settle_boundary();
                self.position_px = geometry.offset_of(self.slot);
                self.mount = Mount::Mounted;
                self.restart_timer(sched);
                debug!(
                    items = self.item_count,
                    slide_width_px = geometry.slide_width_px,
                    items_per_view = self.items_per_view,
                    "discrete carousel mounted"
                );
                Ok(())
            }
            Ok(Measured::Retrying { attempts, handle }) => {
                self.mount = Mount::Measuring { attempts };
                self.retry = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.mount = Mount::Unmounted;
                Err(err)
            }
        }
    }

    /// Moves a strip parked on the boundary slot back into the middle copy.
    /// The shift is exactly one copy's width, so nothing visible changes.
    fn settle_boundary(&mut self) {
        if self.slot < self.boundary() {
            return;
        }
        self.slot -= self.item_count;
        if let Some(geometry) = self.geometry {
            let shift = geometry.total_width_px;
            self.position_px += shift;
            self.transition = self.transition.as_ref().map(|t| t.shifted(shift));
        }
    }

    fn animate_to_slot(&mut self, sched: &mut dyn Scheduler) {
        let Some(geometry) = self.geometry else {
            return;
        };
        let target = geometry.offset_of(self.slot);
        self.transition = Some(Tween::new(
            self.position_px,
            target,
            sched.now(),
            self.config.transition(),
            self.config.easing,
        ));
        if self.frame.is_none() {
            self.frame = Some(sched.request_frame());
        }
    }

    fn on_frame(&mut self, fired: Fired, sched: &mut dyn Scheduler) {
        let Some(transition) = self.transition.as_ref() else {
            return;
        };
        let (value, finished) = transition.sample(fired.at);
        self.position_px = value;

        if !finished {
            self.frame = Some(sched.request_frame());
            return;
        }

        self.transition = None;
        if self.slot >= self.boundary() {
            self.slot -= self.item_count;
            if let Some(geometry) = self.geometry {
                self.position_px = geometry.offset_of(self.slot);
            }
            debug!(index = self.slot, "discrete carousel snapped into middle copy");
        }
    }

    fn restart_timer(&mut self, sched: &mut dyn Scheduler) {
        cancel_slot(&mut self.timer, sched);
        if self.mount == Mount::Mounted && !self.paused {
            self.timer = Some(sched.set_interval(self.config.advance_interval()));
        }
    }

    fn cancel_all(&mut self, sched: &mut dyn Scheduler) {
        cancel_slot(&mut self.timer, sched);
        cancel_slot(&mut self.frame, sched);
        cancel_slot(&mut self.retry, sched);
    }
}

impl Carousel for DiscreteCarousel {
    /// Measures the strip, parks it on the first slot of the middle copy and
    /// starts the advance timer. Mounting again replaces every pending task.
    fn mount(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        self.cancel_all(sched);
        self.transition = None;
        self.mount = Mount::Measuring { attempts: 0 };
        self.try_measure(sched, layout)
    }

    fn on_task(
        &mut self,
        fired: Fired,
        sched: &mut dyn Scheduler,
        layout: &dyn Layout,
    ) -> Result<()> {
        if self.frame == Some(fired.handle) {
            self.frame = None;
            self.on_frame(fired, sched);
        } else if self.timer == Some(fired.handle) {
            if !self.paused {
                self.advance(sched);
            }
        } else if self.retry == Some(fired.handle) {
            self.retry = None;
            self.try_measure(sched, layout)?;
        } else {
            trace!(handle = fired.handle.id(), "ignoring task not owned by carousel");
        }
        Ok(())
    }

    fn pointer_enter(&mut self, sched: &mut dyn Scheduler) {
        if self.paused {
            return;
        }
        self.paused = true;
        cancel_slot(&mut self.timer, sched);
        info!(index = self.current_index(), "discrete carousel paused");
    }

    fn pointer_leave(&mut self, sched: &mut dyn Scheduler) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.restart_timer(sched);
        info!(index = self.current_index(), "discrete carousel resumed");
    }

    /// Re-measures and snaps to the current slot without animating. A change
    /// in items per view restarts the advance timer.
    fn resize(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        if self.mount != Mount::Mounted {
            return Ok(());
        }

        let geometry = match remeasure(layout, self.item_count, self.measure()) {
            Ok(geometry) => geometry,
            Err(CarouselError::GeometryNotReady { .. }) => {
                warn!("layout not measurable during resize; keeping previous geometry");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        cancel_slot(&mut self.frame, sched);
        self.transition = None;
        self.geometry = Some(geometry);
        self.settle_boundary();
        self.position_px = geometry.offset_of(self.slot);

        let per_view = self.breakpoints.items_per_view(layout.viewport_width());
        if per_view != self.items_per_view {
            self.items_per_view = per_view;
            self.restart_timer(sched);
        }
        debug!(
            slide_width_px = geometry.slide_width_px,
            items_per_view = self.items_per_view,
            "discrete carousel re-measured"
        );
        Ok(())
    }

    fn teardown(&mut self, sched: &mut dyn Scheduler) {
        if self.mount == Mount::Unmounted && self.pending_handles().is_empty() {
            return;
        }
        self.cancel_all(sched);
        self.transition = None;
        self.mount = Mount::Unmounted;
        info!("discrete carousel torn down");
    }

    fn position_px(&self) -> f32 {
        self.position_px
    }

    fn pending_handles(&self) -> Vec<TaskHandle> {
        self.timer
            .into_iter()
            .chain(self.frame)
            .chain(self.retry)
            .collect()
    }
}
