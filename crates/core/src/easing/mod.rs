//! Easing curves and the time-based tween used for slide transitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Easing curve applied to a normalised progress value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    /// Fast start, slow end.
    #[default]
    QuadraticOut,
    QuadraticInOut,
    CubicOut,
}

impl Easing {
    /// Evaluates the curve at `t`. Input is clamped to [0, 1] and the curve
    /// maps 0 to 0 and 1 to 1.
    #[inline]
    pub fn evaluate(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let omt = 1.0 - t;
                    1.0 - 2.0 * omt * omt
                }
            }
            Easing::CubicOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt * omt
            }
        }
    }
}

/// Interpolates a position between two values over a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub started_at: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(
        from: f32,
        to: f32,
        started_at: Duration,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        Self {
            from,
            to,
            started_at,
            duration,
            easing,
        }
    }

    /// Returns the value at `now` and whether the tween has completed.
    pub fn sample(&self, now: Duration) -> (f32, bool) {
        let elapsed = now.saturating_sub(self.started_at);
        if elapsed >= self.duration {
            return (self.to, true);
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let eased = self.easing.evaluate(t);
        (self.from + (self.to - self.from) * eased, false)
    }

    /// Moves both endpoints by `offset`, leaving timing untouched.
    pub fn shifted(&self, offset: f32) -> Self {
        Self {
            from: self.from + offset,
            to: self.to + offset,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::QuadraticOut,
        Easing::QuadraticInOut,
        Easing::CubicOut,
    ];

    #[test]
    fn endpoints_are_fixed() {
        for easing in ALL {
            assert_eq!(easing.evaluate(0.0), 0.0, "{easing:?}");
            assert!((easing.evaluate(1.0) - 1.0).abs() < 1e-6, "{easing:?}");
        }
    }

    #[test]
    fn ease_out_leads_linear() {
        assert!(Easing::QuadraticOut.evaluate(0.25) > 0.25);
        assert!(Easing::CubicOut.evaluate(0.25) > Easing::QuadraticOut.evaluate(0.25));
        assert_eq!(Easing::QuadraticInOut.evaluate(0.5), 0.5);
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::Linear.evaluate(-0.5), 0.0);
        assert_eq!(Easing::Linear.evaluate(1.5), 1.0);
    }

    #[test]
    fn tween_reaches_target_exactly() {
        let tween = Tween::new(
            0.0,
            -300.0,
            Duration::from_secs(1),
            Duration::from_millis(800),
            Easing::QuadraticOut,
        );

        let (start, done) = tween.sample(Duration::from_secs(1));
        assert_eq!(start, 0.0);
        assert!(!done);

        let (mid, done) = tween.sample(Duration::from_millis(1400));
        assert!(!done);
        assert!(mid < -150.0 && mid > -300.0, "ease-out passes midpoint early, got {mid}");

        let (end, done) = tween.sample(Duration::from_millis(1800));
        assert_eq!(end, -300.0);
        assert!(done);
    }

    #[test]
    fn zero_duration_tween_finishes_immediately() {
        let tween = Tween::new(5.0, 10.0, Duration::ZERO, Duration::ZERO, Easing::Linear);
        assert_eq!(tween.sample(Duration::ZERO), (10.0, true));
    }
}
