//! Continuous-rate carousel.
//!
//! Position is derived from an explicit start timestamp on every frame rather
//! than accumulated from per-frame deltas, so it never drifts. One copy of the
//! item list scrolls past in `cycle_period_secs`; when the offset reaches one
//! copy's width it resets to zero, which is invisible because the render list
//! holds at least two copies.

use tracing::{debug, info, trace, warn};

use crate::{
    carousel::{cancel_slot, measure_or_retry, Carousel, Measured},
    layout::{remeasure, Geometry, Layout, SlideMeasure},
    CarouselError, ContinuousConfig, Fired, Result, Scheduler, TaskHandle,
};

/// Lifecycle of a continuous carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Waiting for the layout to report a usable width.
    Measuring { attempts: u32 },
    Running,
    Stopped,
}

/// Offset after `elapsed_secs` of uninterrupted motion, in closed form.
pub fn position_at(speed_px_per_sec: f64, total_width_px: f64, elapsed_secs: f64) -> f64 {
    if speed_px_per_sec <= 0.0 || total_width_px <= 0.0 {
        return 0.0;
    }
    let period = total_width_px / speed_px_per_sec;
    -(speed_px_per_sec * elapsed_secs.rem_euclid(period))
}

#[derive(Debug, Clone)]
pub struct ContinuousCarousel {
    item_count: usize,
    config: ContinuousConfig,
    phase: Phase,
    paused: bool,
    geometry: Option<Geometry>,
    speed_px_per_sec: f64,
    position_px: f32,
    /// Virtual start of the current cycle, in scheduler seconds. May be
    /// negative after a resume or relayout early in the session.
    epoch_secs: f64,
    frame: Option<TaskHandle>,
    retry: Option<TaskHandle>,
}

impl ContinuousCarousel {
    pub fn new(item_count: usize, config: ContinuousConfig) -> Result<Self> {
        if item_count == 0 {
            return Err(CarouselError::EmptyItemList);
        }
        config.validate()?;

        Ok(Self {
            item_count,
            config,
            phase: Phase::Idle,
            paused: false,
            geometry: None,
            speed_px_per_sec: 0.0,
            position_px: 0.0,
            epoch_secs: 0.0,
            frame: None,
            retry: None,
        })
    }

    /// Measures the strip and starts the frame loop. Restarting a running
    /// carousel cancels its previous frame chain first.
    pub fn start(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        self.cancel_all(sched);
        self.phase = Phase::Measuring { attempts: 0 };
        self.try_measure(sched, layout)
    }

    pub fn pause(&mut self, sched: &mut dyn Scheduler) {
        if self.paused {
            return;
        }
        self.paused = true;
        cancel_slot(&mut self.frame, sched);
        info!(position_px = self.position_px, "continuous carousel paused");
    }

    /// Resumes from the frozen position. The start timestamp is moved so that
    /// the elapsed-time formula reproduces the current offset exactly.
    pub fn resume(&mut self, sched: &mut dyn Scheduler) {
        if !self.paused {
            return;
        }
        self.paused = false;

        if self.phase == Phase::Running {
            self.rebase_epoch(sched.now().as_secs_f64());
            self.request_frame(sched);
        }
        info!(position_px = self.position_px, "continuous carousel resumed");
    }

    pub fn stop(&mut self, sched: &mut dyn Scheduler) {
        if self.phase == Phase::Stopped {
            return;
        }
        self.cancel_all(sched);
        self.phase = Phase::Stopped;
        info!("continuous carousel stopped");
    }

    /// Re-measures after a layout change, keeping the same fraction of the
    /// cycle so the strip does not jump to a different item.
    pub fn relayout(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        let Some(old) = self.geometry else {
            return Ok(());
        };
        if self.phase != Phase::Running {
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

        let progress = self.position_px / old.total_width_px;
        self.apply_geometry(geometry);
        self.position_px = progress * geometry.total_width_px;
        self.rebase_epoch(sched.now().as_secs_f64());

        cancel_slot(&mut self.frame, sched);
        if !self.paused {
            self.request_frame(sched);
        }
        debug!(
            slide_width_px = geometry.slide_width_px,
            position_px = self.position_px,
            "continuous carousel re-measured"
        );
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn speed_px_per_sec(&self) -> f64 {
        self.speed_px_per_sec
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Offset the next frame would compute at scheduler time `now`.
    pub fn projected_position(&self, now_secs: f64) -> f32 {
        match self.geometry {
            Some(geometry) if !self.paused && self.phase == Phase::Running => position_at(
                self.speed_px_per_sec,
                geometry.total_width_px as f64,
                now_secs - self.epoch_secs,
            ) as f32,
            _ => self.position_px,
        }
    }

    fn measure(&self) -> SlideMeasure {
        SlideMeasure::WidthPlusGap(self.config.gap)
    }

    fn try_measure(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        let previous = match self.phase {
            Phase::Measuring { attempts } => attempts,
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
                self.begin(geometry, sched);
                Ok(())
            }
            Ok(Measured::Retrying { attempts, handle }) => {
                self.phase = Phase::Measuring { attempts };
                self.retry = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.phase = Phase::Stopped;
                Err(err)
            }
        }
    }

    fn begin(&mut self, geometry: Geometry, sched: &mut dyn Scheduler) {
        self.apply_geometry(geometry);
        self.position_px = 0.0;
        self.epoch_secs = sched.now().as_secs_f64();
        self.phase = Phase::Running;
        debug!(
            items = self.item_count,
            slide_width_px = geometry.slide_width_px,
            speed_px_per_sec = self.speed_px_per_sec,
            "continuous carousel started"
        );
        if !self.paused {
            self.request_frame(sched);
        }
    }

    fn apply_geometry(&mut self, geometry: Geometry) {
        self.geometry = Some(geometry);
        self.speed_px_per_sec = geometry.total_width_px as f64 / self.config.cycle_period_secs;
    }

    fn rebase_epoch(&mut self, now_secs: f64) {
        let offset = (self.position_px.abs() as f64) / self.speed_px_per_sec;
        self.epoch_secs = now_secs - offset;
    }

    fn on_frame(&mut self, now_secs: f64, sched: &mut dyn Scheduler) {
        let Some(geometry) = self.geometry else {
            return;
        };
        if self.paused || self.phase != Phase::Running {
            return;
        }

        let total = geometry.total_width_px as f64;
        let elapsed = now_secs - self.epoch_secs;
        self.position_px = position_at(self.speed_px_per_sec, total, elapsed) as f32;

        // The epoch moves by whole cycles so the overshoot past one copy is
        // kept and the strip stays in phase.
        let period = total / self.speed_px_per_sec;
        let cycles = (elapsed / period).floor();
        if cycles >= 1.0 {
            self.epoch_secs += cycles * period;
            debug!(at_secs = now_secs, cycles, "continuous carousel wrapped");
        }
        self.request_frame(sched);
    }

    fn request_frame(&mut self, sched: &mut dyn Scheduler) {
        cancel_slot(&mut self.frame, sched);
        self.frame = Some(sched.request_frame());
    }

    fn cancel_all(&mut self, sched: &mut dyn Scheduler) {
        cancel_slot(&mut self.frame, sched);
        cancel_slot(&mut self.retry, sched);
    }
}

impl Carousel for ContinuousCarousel {
    fn mount(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        self.start(sched, layout)
    }

    fn on_task(
        &mut self,
        fired: Fired,
        sched: &mut dyn Scheduler,
        layout: &dyn Layout,
    ) -> Result<()> {
        if self.frame == Some(fired.handle) {
            self.frame = None;
            self.on_frame(fired.at.as_secs_f64(), sched);
        } else if self.retry == Some(fired.handle) {
            self.retry = None;
            self.try_measure(sched, layout)?;
        } else {
            trace!(handle = fired.handle.id(), "ignoring task not owned by carousel");
        }
        Ok(())
    }

    fn pointer_enter(&mut self, sched: &mut dyn Scheduler) {
        self.pause(sched);
    }

    fn pointer_leave(&mut self, sched: &mut dyn Scheduler) {
        self.resume(sched);
    }

    fn resize(&mut self, sched: &mut dyn Scheduler, layout: &dyn Layout) -> Result<()> {
        self.relayout(sched, layout)
    }

    fn teardown(&mut self, sched: &mut dyn Scheduler) {
        self.stop(sched);
    }

    fn position_px(&self) -> f32 {
        self.position_px
    }

    fn pending_handles(&self) -> Vec<TaskHandle> {
        self.frame.into_iter().chain(self.retry).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::{drive, layout::StaticLayout, ManualScheduler, RetryPolicy};

    fn secs(v: f64) -> Duration {
        Duration::from_secs_f64(v)
    }

    /// 1280px viewport uses the 24px gap, so 276px cards give 300px slides.
    fn desktop_strip() -> StaticLayout {
        StaticLayout::new(1280.0, 276.0, 24.0, 6)
    }

    fn started(period: f64, layout: &StaticLayout) -> (ContinuousCarousel, ManualScheduler) {
        let mut sched = ManualScheduler::new(Duration::from_millis(250));
        let config = ContinuousConfig::default().with_cycle_period(period);
        let mut carousel = ContinuousCarousel::new(3, config).unwrap();
        carousel.start(&mut sched, layout).unwrap();
        (carousel, sched)
    }

    #[test]
    fn derives_speed_from_cycle_period() {
        let layout = desktop_strip();
        let (carousel, _) = started(30.0, &layout);

        let geometry = carousel.geometry().unwrap();
        assert_eq!(geometry.slide_width_px, 300.0);
        assert_eq!(geometry.total_width_px, 900.0);
        assert_eq!(carousel.speed_px_per_sec(), 30.0);
        assert_eq!(carousel.phase(), Phase::Running);
    }

    #[test]
    fn moves_left_and_wraps_after_one_cycle() {
        let layout = desktop_strip();
        let (mut carousel, mut sched) = started(30.0, &layout);

        drive(&mut carousel, &mut sched, &layout, secs(15.0)).unwrap();
        assert!((carousel.position_px() + 450.0).abs() < 1e-3);

        drive(&mut carousel, &mut sched, &layout, secs(30.0)).unwrap();
        assert_eq!(carousel.position_px(), 0.0);

        drive(&mut carousel, &mut sched, &layout, secs(45.0)).unwrap();
        assert!((carousel.position_px() + 450.0).abs() < 1e-3);
    }

    #[test]
    fn position_is_periodic_in_steady_state() {
        let layout = desktop_strip();
        let (mut carousel, mut sched) = started(30.0, &layout);

        let mut first = Vec::new();
        for step in 1..=40 {
            drive(&mut carousel, &mut sched, &layout, secs(step as f64 * 0.5)).unwrap();
            first.push(carousel.position_px());
        }
        drive(&mut carousel, &mut sched, &layout, secs(30.0)).unwrap();
        for (step, expected) in (1..=40).zip(first) {
            let at = secs(30.0 + step as f64 * 0.5);
            drive(&mut carousel, &mut sched, &layout, at).unwrap();
            assert!((carousel.position_px() - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn magnitude_never_exceeds_one_copy() {
        let layout = desktop_strip();
        let (mut carousel, mut sched) = started(7.0, &layout);

        while sched.now() < secs(60.0) {
            let next = sched.now() + Duration::from_millis(250);
            drive(&mut carousel, &mut sched, &layout, next).unwrap();
            assert!(carousel.position_px() <= 0.0);
            assert!(carousel.position_px() >= -900.0);
        }
    }

    #[test]
    fn resume_continues_from_frozen_position() {
        // 100px slides over 30s give 10px/s.
        let layout = StaticLayout::new(1280.0, 76.0, 24.0, 6);
        let (mut carousel, mut sched) = started(30.0, &layout);
        assert_eq!(carousel.speed_px_per_sec(), 10.0);

        drive(&mut carousel, &mut sched, &layout, secs(10.0)).unwrap();
        carousel.pointer_enter(&mut sched);
        assert!((carousel.position_px() + 100.0).abs() < 1e-3);
        assert_eq!(sched.pending_frames(), 0);

        drive(&mut carousel, &mut sched, &layout, secs(40.0)).unwrap();
        assert!((carousel.position_px() + 100.0).abs() < 1e-3);

        carousel.pointer_leave(&mut sched);
        assert!((carousel.projected_position(40.0) + 100.0).abs() < 1e-3);

        drive(&mut carousel, &mut sched, &layout, secs(40.25)).unwrap();
        let one_frame = 10.0 * 0.25;
        assert!((carousel.position_px() + 100.0).abs() <= one_frame + 1e-3);
    }

    #[test]
    fn pause_resume_and_stop_are_idempotent() {
        let layout = desktop_strip();
        let (mut carousel, mut sched) = started(30.0, &layout);
        drive(&mut carousel, &mut sched, &layout, secs(3.0)).unwrap();

        carousel.pause(&mut sched);
        let frozen = carousel.position_px();
        carousel.pause(&mut sched);
        assert!(carousel.is_paused());
        assert_eq!(carousel.position_px(), frozen);

        carousel.resume(&mut sched);
        carousel.resume(&mut sched);
        assert_eq!(sched.pending_frames(), 1);

        carousel.stop(&mut sched);
        carousel.stop(&mut sched);
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(carousel.phase(), Phase::Stopped);
    }

    #[test]
    fn restarting_never_leaves_two_frame_chains() {
        let layout = desktop_strip();
        let (mut carousel, mut sched) = started(30.0, &layout);
        carousel.start(&mut sched, &layout).unwrap();
        assert_eq!(sched.pending_frames(), 1);

        drive(&mut carousel, &mut sched, &layout, secs(10.0)).unwrap();
        assert_eq!(sched.pending_frames(), 1);
        assert!((carousel.position_px() + 300.0).abs() < 1e-3);
    }

    #[test]
    fn retries_until_layout_is_ready() {
        let mut sched = ManualScheduler::new(Duration::from_millis(250));
        let mut carousel = ContinuousCarousel::new(3, ContinuousConfig::default()).unwrap();
        let mut layout = StaticLayout::unmeasured(1280.0, 6);

        carousel.start(&mut sched, &layout).unwrap();
        assert_eq!(carousel.phase(), Phase::Measuring { attempts: 1 });

        let deadline = Duration::from_millis(350);
        drive(&mut carousel, &mut sched, &layout, deadline).unwrap();
        assert_eq!(carousel.phase(), Phase::Measuring { attempts: 4 });

        layout.resize(1280.0, 276.0);
        let deadline = Duration::from_millis(400);
        drive(&mut carousel, &mut sched, &layout, deadline).unwrap();
        assert_eq!(carousel.phase(), Phase::Running);
        assert_eq!(carousel.geometry().unwrap().slide_width_px, 300.0);
    }

    #[test]
    fn gives_up_after_retry_budget() {
        let mut sched = ManualScheduler::default();
        let config = ContinuousConfig {
            retry: RetryPolicy {
                interval_ms: 100,
                max_attempts: 5,
            },
            ..Default::default()
        };
        let mut carousel = ContinuousCarousel::new(3, config).unwrap();
        let layout = StaticLayout::unmeasured(1280.0, 6);

        carousel.start(&mut sched, &layout).unwrap();
        let err = drive(&mut carousel, &mut sched, &layout, secs(10.0)).unwrap_err();
        assert!(matches!(err, CarouselError::GeometryNotReady { attempts: 5 }));
        assert_eq!(carousel.phase(), Phase::Stopped);
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn stale_frame_after_teardown_is_ignored() {
        let layout = desktop_strip();
        let (mut carousel, mut sched) = started(30.0, &layout);
        drive(&mut carousel, &mut sched, &layout, secs(1.0)).unwrap();
        let stale = carousel.pending_handles()[0];
        let before = carousel.position_px();

        carousel.teardown(&mut sched);
        let late = Fired {
            handle: stale,
            at: secs(2.0),
        };
        carousel.on_task(late, &mut sched, &layout).unwrap();

        assert_eq!(carousel.position_px(), before);
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn relayout_keeps_cycle_progress() {
        let mut layout = desktop_strip();
        let (mut carousel, mut sched) = started(30.0, &layout);
        drive(&mut carousel, &mut sched, &layout, secs(10.0)).unwrap();
        assert!((carousel.position_px() + 300.0).abs() < 1e-3);

        // Slides grow from 300px to 600px.
        layout.resize(1280.0, 576.0);
        carousel.resize(&mut sched, &layout).unwrap();
        assert_eq!(carousel.geometry().unwrap().total_width_px, 1800.0);
        assert!((carousel.position_px() + 600.0).abs() < 1e-3);
        assert_eq!(sched.pending_frames(), 1);

        drive(&mut carousel, &mut sched, &layout, secs(20.0)).unwrap();
        assert!((carousel.position_px() + 1200.0).abs() < 1e-2);
    }

    #[test]
    fn rejects_empty_lists_and_bad_periods() {
        assert!(matches!(
            ContinuousCarousel::new(0, ContinuousConfig::default()),
            Err(CarouselError::EmptyItemList)
        ));
        let config = ContinuousConfig::default().with_cycle_period(-1.0);
        assert!(ContinuousCarousel::new(3, config).is_err());
    }

    /// Frame time closest to `t` on a chain of `frame`-long frames from zero.
    fn nearest_frame(frame: Duration, t: f64) -> Duration {
        frame * (t / frame.as_secs_f64()).round() as u32
    }

    /// Distance between two offsets, treating `0` and `-total` as the same
    /// picture.
    fn cyclic_diff(a: f64, b: f64, total: f64) -> f64 {
        let diff = (a - b).rem_euclid(total);
        diff.min(total - diff)
    }

    #[test]
    fn stays_in_phase_when_frames_straddle_the_wrap() {
        let layout = desktop_strip();
        let mut sched = ManualScheduler::with_frame_rate(60.0);
        let frame = sched.frame_interval();
        let config = ContinuousConfig::default().with_cycle_period(7.31);
        let mut carousel = ContinuousCarousel::new(3, config).unwrap();
        carousel.start(&mut sched, &layout).unwrap();
        let speed = carousel.speed_px_per_sec();

        let first = nearest_frame(frame, 10.0);
        drive(&mut carousel, &mut sched, &layout, first).unwrap();
        let reference = carousel.position_px() as f64;

        for cycle in [1u32, 10, 100] {
            let at = nearest_frame(frame, first.as_secs_f64() + cycle as f64 * 7.31);
            drive(&mut carousel, &mut sched, &layout, at).unwrap();
            let expected = -speed * at.as_secs_f64();
            let pos = carousel.position_px() as f64;
            assert!(cyclic_diff(pos, expected, 900.0) < 1e-2, "cycle {cycle}: {pos}");
            // Frame times can differ from an exact cycle by half a frame.
            let slack = speed * frame.as_secs_f64() / 2.0 + 1e-2;
            assert!(cyclic_diff(pos, reference, 900.0) <= slack, "cycle {cycle}: {pos}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn closed_form_is_periodic(
            items in 1usize..20,
            slide in 50.0f64..600.0,
            period in 1.0f64..120.0,
            t in 0.0f64..500.0,
        ) {
            let total = slide * items as f64;
            let speed = total / period;
            let a = position_at(speed, total, t);
            let b = position_at(speed, total, t + period);
            prop_assert!(cyclic_diff(a, b, total) < 1e-6 * total.max(1.0));
            prop_assert!(a <= 0.0 && a > -total - 1e-9);
        }

        #[test]
        fn engine_tracks_closed_form_over_many_cycles(
            period in 2.0f64..9.0,
            frame_us in 8_000u64..34_000,
            cycles in 20u32..60,
        ) {
            let layout = desktop_strip();
            let frame = Duration::from_micros(frame_us);
            let mut sched = ManualScheduler::new(frame);
            let config = ContinuousConfig::default().with_cycle_period(period);
            let mut carousel = ContinuousCarousel::new(3, config).unwrap();
            carousel.start(&mut sched, &layout).unwrap();
            let speed = carousel.speed_px_per_sec();

            let start = nearest_frame(frame, period / 3.0);
            drive(&mut carousel, &mut sched, &layout, start).unwrap();
            let reference = carousel.position_px() as f64;

            let end = nearest_frame(frame, start.as_secs_f64() + cycles as f64 * period);
            drive(&mut carousel, &mut sched, &layout, end).unwrap();
            let pos = carousel.position_px() as f64;

            prop_assert!(cyclic_diff(pos, -speed * end.as_secs_f64(), 900.0) < 1e-2);
            let slack = speed * frame.as_secs_f64() / 2.0 + 1e-2;
            prop_assert!(cyclic_diff(pos, reference, 900.0) <= slack);
        }

        #[test]
        fn resume_never_jumps(pause_at in 0.5f64..90.0, paused_for in 0.0f64..120.0) {
            let layout = desktop_strip();
            let (mut carousel, mut sched) = started(30.0, &layout);

            drive(&mut carousel, &mut sched, &layout, secs(pause_at)).unwrap();
            carousel.pause(&mut sched);
            let frozen = carousel.position_px();

            let resume_at = pause_at + paused_for;
            drive(&mut carousel, &mut sched, &layout, secs(resume_at)).unwrap();
            carousel.resume(&mut sched);

            let now = sched.now().as_secs_f64();
            prop_assert!((carousel.projected_position(now) - frozen).abs() < 1e-2);
        }
    }
}
