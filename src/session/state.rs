use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::models::Frame;
use crate::posture::{PostureConfig, PostureDurations, PostureMonitor, PostureReport};
use crate::recording::LandmarkBuffer;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Paused,
    /// Recording closed, score pending or already delivered.
    Closed,
}

impl SessionPhase {
    pub fn is_live(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::Paused)
    }
}

/// What the UI sees of the current session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub session_id: Option<String>,
    pub exercise_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub active_ms: u64,
    pub recorded_frames: usize,
    pub recording: bool,
}

/// Everything `finish` needs once the recording is closed.
#[derive(Debug, Clone)]
pub struct ClosedSession {
    pub session_id: String,
    pub exercise_id: String,
    pub started_at: DateTime<Utc>,
    pub active_ms: u64,
    pub recording: Arc<[Frame]>,
    pub posture: PostureDurations,
}

/// Result of routing one frame into a live session.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub recorded: Result<(), RecordError>,
    pub posture: PostureReport,
}

#[derive(Debug)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub session_id: Option<String>,
    pub exercise_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub active_ms: u64,
    /// Time accumulated from earlier active windows; combines with
    /// `running_anchor` to compute the true active duration.
    active_ms_baseline: u64,
    running_anchor: Option<Instant>,
    buffer: LandmarkBuffer,
    posture: PostureMonitor,
    closed_recording: Option<Arc<[Frame]>>,
}

impl SessionState {
    pub fn new(posture: PostureConfig) -> Self {
        Self {
            phase: SessionPhase::Idle,
            session_id: None,
            exercise_id: None,
            started_at: None,
            active_ms: 0,
            active_ms_baseline: 0,
            running_anchor: None,
            buffer: LandmarkBuffer::new(),
            posture: PostureMonitor::new(posture),
            closed_recording: None,
        }
    }

    pub fn current_active_ms(&self, now: Instant) -> u64 {
        match (self.phase, self.running_anchor) {
            (SessionPhase::Active, Some(anchor)) => self
                .active_ms_baseline
                .saturating_add(now.saturating_duration_since(anchor).as_millis() as u64),
            _ => self.active_ms,
        }
    }

    pub fn sync_active(&mut self, now: Instant) {
        self.active_ms = self.current_active_ms(now);
    }

    pub fn begin(
        &mut self,
        session_id: String,
        exercise_id: String,
        started_at: DateTime<Utc>,
        now: Instant,
    ) {
        self.phase = SessionPhase::Active;
        self.session_id = Some(session_id);
        self.exercise_id = Some(exercise_id);
        self.started_at = Some(started_at);
        self.active_ms = 0;
        self.active_ms_baseline = 0;
        self.running_anchor = Some(now);
        self.buffer = LandmarkBuffer::new();
        self.posture.reset();
        self.closed_recording = None;
    }

    /// Returns false when there was nothing to pause.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.phase != SessionPhase::Active {
            return false;
        }
        self.sync_active(now);
        self.active_ms_baseline = self.active_ms;
        self.running_anchor = None;
        self.phase = SessionPhase::Paused;
        self.buffer.set_paused(true);
        self.posture.pause(now);
        true
    }

    /// Returns false when there was nothing to resume.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.phase != SessionPhase::Paused {
            return false;
        }
        self.running_anchor = Some(now);
        self.phase = SessionPhase::Active;
        self.buffer.set_paused(false);
        self.posture.resume(now);
        true
    }

    pub fn set_reference_clock(&mut self, running: bool) {
        self.buffer.set_clock_running(running);
    }

    /// Drops everything recorded so far and starts the clocks over.
    pub fn restart(&mut self, now: Instant) {
        self.buffer.reset();
        self.posture.reset();
        self.active_ms = 0;
        self.active_ms_baseline = 0;
        self.running_anchor = (self.phase == SessionPhase::Active).then_some(now);
    }

    /// Routes a frame into the recording and the posture monitor.
    /// Frames seen while not active are ignored entirely.
    pub fn observe(&mut self, frame: Frame, now: Instant) -> Option<FrameOutcome> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        let posture = self.posture.observe(&frame.landmarks, now);
        let recorded = self.buffer.try_record(frame);
        Some(FrameOutcome { recorded, posture })
    }

    /// Stops the clocks and snapshots the recording.
    pub fn close(&mut self, now: Instant) -> Option<ClosedSession> {
        if !self.phase.is_live() {
            return None;
        }
        self.sync_active(now);
        self.running_anchor = None;
        let posture = self.posture.finish(now);
        self.posture.pause(now);

        let recording = self.buffer.snapshot();
        self.buffer.reset();
        self.closed_recording = Some(recording.clone());
        self.phase = SessionPhase::Closed;

        Some(ClosedSession {
            session_id: self.session_id.clone()?,
            exercise_id: self.exercise_id.clone()?,
            started_at: self.started_at?,
            active_ms: self.active_ms,
            recording,
            posture,
        })
    }

    pub fn closed_recording(&self) -> Option<(Arc<[Frame]>, &str)> {
        let recording = self.closed_recording.clone()?;
        let exercise_id = self.exercise_id.as_deref()?;
        Some((recording, exercise_id))
    }

    pub fn posture_report(&self) -> PostureReport {
        self.posture.report()
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            session_id: self.session_id.clone(),
            exercise_id: self.exercise_id.clone(),
            started_at: self.started_at,
            active_ms: self.current_active_ms(now),
            recorded_frames: self.buffer.len(),
            recording: self.phase == SessionPhase::Active && self.buffer.is_recording(),
        }
    }

    /// Forgets the session, recording included.
    pub fn discard(&mut self) {
        let config = self.posture_config();
        *self = Self::new(config);
    }

    fn posture_config(&self) -> PostureConfig {
        self.posture.config().clone()
    }
}
