use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{CarouselError, CarouselMode, Easing, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine used when the host does not pick one explicitly.
    pub mode: CarouselMode,
    pub continuous: ContinuousConfig,
    pub discrete: DiscreteConfig,
    pub viewport: ViewportConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Parses a (possibly partial) JSON document. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.continuous.validate()?;
        self.discrete.validate()?;
        self.viewport.validate()?;
        self.scheduler.validate()
    }
}

/// Settings for the pixel-rate strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousConfig {
    /// Seconds needed to scroll through one full copy of the item list.
    pub cycle_period_secs: f64,
    /// How many copies of the item list are rendered back to back.
    pub duplication: usize,
    pub gap: GapPolicy,
    pub retry: RetryPolicy,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            cycle_period_secs: 35.0,
            duplication: 2,
            gap: GapPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ContinuousConfig {
    pub fn with_cycle_period(mut self, secs: f64) -> Self {
        self.cycle_period_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cycle_period_secs.is_finite() && self.cycle_period_secs > 0.0) {
            return Err(CarouselError::InvalidInput(
                "cycle period must be a positive number of seconds",
            ));
        }
        if self.duplication < 2 {
            return Err(CarouselError::InvalidInput(
                "continuous strips need at least two copies of the items",
            ));
        }
        self.gap.validate()?;
        self.retry.validate()
    }
}

/// Settings for the slide-by-slide strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscreteConfig {
    pub advance_interval_secs: f64,
    pub transition_secs: f64,
    pub easing: Easing,
    /// Copies of the item list; the middle copy is the resting block.
    pub duplication: usize,
    pub retry: RetryPolicy,
}

impl Default for DiscreteConfig {
    fn default() -> Self {
        Self {
            advance_interval_secs: 3.0,
            transition_secs: 0.8,
            easing: Easing::QuadraticOut,
            duplication: 3,
            retry: RetryPolicy::default(),
        }
    }
}

impl DiscreteConfig {
    pub fn advance_interval(&self) -> Duration {
        Duration::from_secs_f64(self.advance_interval_secs)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_secs_f64(self.transition_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.advance_interval_secs.is_finite() && self.advance_interval_secs > 0.0) {
            return Err(CarouselError::InvalidInput(
                "advance interval must be a positive number of seconds",
            ));
        }
        if !(self.transition_secs.is_finite() && self.transition_secs >= 0.0) {
            return Err(CarouselError::InvalidInput(
                "transition duration must not be negative",
            ));
        }
        if self.duplication < 3 {
            return Err(CarouselError::InvalidInput(
                "slide strips need at least three copies of the items",
            ));
        }
        self.retry.validate()
    }
}

/// Inter-item gap as a function of the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapPolicy {
    pub compact_px: f32,
    pub wide_px: f32,
    /// Viewports at least this wide use `wide_px`.
    pub wide_from_px: f32,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            compact_px: 16.0,
            wide_px: 24.0,
            wide_from_px: 768.0,
        }
    }
}

impl GapPolicy {
    fn validate(&self) -> Result<()> {
        let values = [self.compact_px, self.wide_px, self.wide_from_px];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CarouselError::InvalidInput(
                "gap settings must be non-negative numbers",
            ));
        }
        Ok(())
    }
}

/// Bounded retry used while the layout has not produced a usable width yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_attempts: 50,
        }
    }
}

impl RetryPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(CarouselError::InvalidInput(
                "retry policy must allow at least one attempt",
            ));
        }
        if self.interval_ms == 0 {
            return Err(CarouselError::InvalidInput(
                "retry interval must be at least one millisecond",
            ));
        }
        Ok(())
    }
}

/// Responsive bands used to derive the number of visible items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub tablet_px: f32,
    pub desktop_px: f32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            tablet_px: 768.0,
            desktop_px: 1024.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub breakpoints: Breakpoints,
}

impl ViewportConfig {
    fn validate(&self) -> Result<()> {
        let bp = self.breakpoints;
        if !(bp.tablet_px > 0.0 && bp.desktop_px > bp.tablet_px) {
            return Err(CarouselError::InvalidInput(
                "breakpoints must be positive and strictly increasing",
            ));
        }
        Ok(())
    }
}

/// Settings for the virtual clock driving simulations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub frame_rate_hz: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { frame_rate_hz: 60.0 }
    }
}

impl SchedulerConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz)
    }

    fn validate(&self) -> Result<()> {
        if !(self.frame_rate_hz.is_finite() && self.frame_rate_hz >= 1.0) {
            return Err(CarouselError::InvalidInput(
                "frame rate must be at least one frame per second",
            ));
        }
        Ok(())
    }
}
