use std::sync::Arc;

use crate::error::RecordError;
use crate::models::{Frame, LANDMARK_COUNT};

/// User frames captured while a session is live.
///
/// Frames are only kept while the session is unpaused and the reference
/// playback clock is running; anything else is dropped on the floor.
#[derive(Debug, Clone)]
pub struct LandmarkBuffer {
    frames: Vec<Frame>,
    paused: bool,
    clock_running: bool,
}

impl Default for LandmarkBuffer {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            paused: false,
            clock_running: true,
        }
    }
}

impl LandmarkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        !self.paused && self.clock_running
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_clock_running(&mut self, running: bool) {
        self.clock_running = running;
    }

    /// Appends the frame, or says why it was rejected.
    pub fn try_record(&mut self, frame: Frame) -> Result<(), RecordError> {
        if !self.is_recording() {
            return Err(RecordError::NotRecording);
        }
        if frame.landmarks.len() != LANDMARK_COUNT {
            return Err(RecordError::DetectionGap {
                found: frame.landmarks.len(),
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Appends the frame when it qualifies. Returns whether it was kept.
    pub fn record(&mut self, frame: Frame) -> bool {
        self.try_record(frame).is_ok()
    }

    pub fn reset(&mut self) {
        self.frames.clear();
    }

    pub fn snapshot(&self) -> Arc<[Frame]> {
        Arc::from(self.frames.as_slice())
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
