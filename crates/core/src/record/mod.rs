use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// One observation of a carousel's motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub at_secs: f64,
    pub position_px: f32,
    /// Current slide index for slide strips; absent for continuous strips.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index: Option<usize>,
    pub paused: bool,
}

/// Collects motion samples while recording and persists them as JSON.
#[derive(Debug, Default)]
pub struct MotionRecorder {
    samples: Vec<MotionSample>,
    is_recording: bool,
}

impl MotionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.samples.clear();
        self.is_recording = true;
    }

    pub fn stop(&mut self) {
        self.is_recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Stores the sample if recording; otherwise drops it.
    pub fn push(&mut self, sample: MotionSample) {
        if self.is_recording {
            self.samples.push(sample);
        }
    }

    pub fn samples(&self) -> &[MotionSample] {
        &self.samples
    }

    /// Largest jump between consecutive samples, in pixels.
    pub fn max_step_px(&self) -> f32 {
        self.samples
            .windows(2)
            .map(|w| (w[1].position_px - w[0].position_px).abs())
            .fold(0.0, f32::max)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.samples)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
