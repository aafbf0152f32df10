//! Scheduling capability used by the carousel engines.
//!
//! Engines never touch a real clock. They ask a [`Scheduler`] for the current
//! time and for frame, timeout and interval callbacks, and the host hands each
//! fired task back to the engine that owns its handle. [`ManualScheduler`] is a
//! deterministic virtual-clock implementation used by tests and the CLI.

use std::{collections::BTreeMap, time::Duration};

/// Opaque identifier of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A task whose due time has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TaskHandle,
    /// Scheduler time at which the task fired.
    pub at: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Fires once, aligned to the next repaint.
    Frame,
    Timeout,
    /// Re-arms itself with the given period until cancelled.
    Interval(Duration),
}

pub trait Scheduler {
    /// Monotonic time since the scheduler's origin.
    fn now(&self) -> Duration;

    /// Requests a single callback on the next display frame.
    fn request_frame(&mut self) -> TaskHandle;

    fn set_timeout(&mut self, delay: Duration) -> TaskHandle;

    fn set_interval(&mut self, period: Duration) -> TaskHandle;

    /// Cancels a pending task. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TaskHandle);
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: Duration,
    kind: TaskKind,
}

/// Virtual clock that only moves when the host tells it to.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: Duration,
    frame_interval: Duration,
    next_id: u64,
    pending: BTreeMap<TaskHandle, Pending>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::with_frame_rate(60.0)
    }
}

impl ManualScheduler {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frame_interval: frame_interval.max(Duration::from_nanos(1)),
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn with_frame_rate(hz: f64) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / hz.max(1.0)))
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Removes and returns the earliest task due at or before `deadline`,
    /// moving the clock to its due time. Intervals are re-armed.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<Fired> {
        let (handle, pending) = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= deadline)
            .min_by_key(|(handle, p)| (p.due, **handle))
            .map(|(handle, p)| (*handle, *p))?;

        match pending.kind {
            TaskKind::Interval(period) => {
                if let Some(slot) = self.pending.get_mut(&handle) {
                    slot.due = pending.due + period;
                }
            }
            TaskKind::Frame | TaskKind::Timeout => {
                self.pending.remove(&handle);
            }
        }

        self.now = self.now.max(pending.due);
        Some(Fired {
            handle,
            at: self.now,
        })
    }

    /// Moves the clock forward without firing anything. The clock never runs
    /// backwards.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.count_kind(|kind| matches!(kind, TaskKind::Frame))
    }

    pub fn pending_intervals(&self) -> usize {
        self.count_kind(|kind| matches!(kind, TaskKind::Interval(_)))
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.values().map(|p| p.due).min()
    }

    fn count_kind(&self, pred: impl Fn(&TaskKind) -> bool) -> usize {
        self.pending.values().filter(|p| pred(&p.kind)).count()
    }

    fn insert(&mut self, due: Duration, kind: TaskKind) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        self.pending.insert(handle, Pending { due, kind });
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn request_frame(&mut self) -> TaskHandle {
        let due = self.now + self.frame_interval;
        self.insert(due, TaskKind::Frame)
    }

    fn set_timeout(&mut self, delay: Duration) -> TaskHandle {
        let due = self.now + delay;
        self.insert(due, TaskKind::Timeout)
    }

    fn set_interval(&mut self, period: Duration) -> TaskHandle {
        let period = period.max(Duration::from_nanos(1));
        let due = self.now + period;
        self.insert(due, TaskKind::Interval(period))
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.pending.remove(&handle);
    }
}
