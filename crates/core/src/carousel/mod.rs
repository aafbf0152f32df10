//! Common driving surface shared by both carousel engines.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    layout::{remeasure, Geometry, Layout, SlideMeasure},
    CarouselError, Fired, ManualScheduler, Result, RetryPolicy, Scheduler, TaskHandle,
};

/// Strategy used to move the strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CarouselMode {
    /// Pixel-per-second translation recomputed every frame.
    #[default]
    Continuous,
    /// Slide-by-slide steps on a fixed timer.
    Discrete,
}

/// Event surface of a carousel engine. Every method runs on the host's single
/// event loop; the scheduler and layout are borrowed for the call only.
pub trait Carousel {
    /// Measures the strip and begins moving it.
    fn mount(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()>;

    /// Handles a fired task. Tasks the engine no longer owns are ignored.
    fn on_task(
        &mut self,
        fired: Fired,
        sched: &mut dyn Scheduler,
        layout: &dyn Layout,
    ) -> Result<()>;

    fn pointer_enter(&mut self, sched: &mut dyn Scheduler);

    fn pointer_leave(&mut self, sched: &mut dyn Scheduler);

    /// Re-measures after a container or viewport change.
    fn resize(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()>;

    /// Cancels everything the engine has scheduled. Safe to call repeatedly.
    fn teardown(&mut self, sched: &mut dyn Scheduler);

    /// Current horizontal translation of the strip.
    fn position_px(&self) -> f32;

    /// Handles of every task the engine currently owns.
    fn pending_handles(&self) -> Vec<TaskHandle>;
}

/// Dispatches every task due up to `deadline` in time order, then moves the
/// clock to `deadline`. Returns the number of tasks fired.
pub fn drive<C: Carousel + ?Sized>(
    carousel: &mut C,
    sched: &mut ManualScheduler,
    layout: &dyn Layout,
    deadline: Duration,
) -> Result<usize> {
    let mut fired = 0;
    while let Some(task) = sched.pop_due(deadline) {
        carousel.on_task(task, sched, layout)?;
        fired += 1;
    }
    sched.advance_to(deadline);
    Ok(fired)
}

/// Outcome of one bounded measurement attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Measured {
    Ready(Geometry),
    Retrying { attempts: u32, handle: TaskHandle },
}

/// Measures the strip, scheduling a retry while the layout is not ready.
/// `previous_attempts` counts failed measurements so far; once the policy's
/// budget is spent the not-ready error is returned to the caller.
pub(crate) fn measure_or_retry(
    layout: &dyn Layout,
    item_count: usize,
    measure: SlideMeasure,
    policy: RetryPolicy,
    previous_attempts: u32,
    sched: &mut dyn Scheduler,
) -> Result<Measured> {
    match remeasure(layout, item_count, measure) {
        Ok(geometry) => Ok(Measured::Ready(geometry)),
        Err(CarouselError::GeometryNotReady { .. }) => {
            let attempts = previous_attempts + 1;
            if attempts >= policy.max_attempts {
                tracing::warn!(attempts, "layout never became measurable; giving up");
                return Err(CarouselError::GeometryNotReady { attempts });
            }
            tracing::warn!(
                attempts,
                retry_ms = policy.interval_ms,
                "layout not ready; retrying measurement"
            );
            let handle = sched.set_timeout(policy.interval());
            Ok(Measured::Retrying { attempts, handle })
        }
        Err(err) => Err(err),
    }
}

pub(crate) fn cancel_slot(slot: &mut Option<TaskHandle>, sched: &mut dyn Scheduler) {
    if let Some(handle) = slot.take() {
        sched.cancel(handle);
    }
}
