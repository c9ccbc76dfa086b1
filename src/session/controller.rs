use std::{sync::Arc, time::Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Frame, Session, SessionStatus, SessionSummary};
use crate::posture::{PostureConfig, PostureDurations, PostureReport};
use crate::scoring::SessionScorer;

use super::events::SessionEvent;
use super::ingest::ingest_loop;
use super::state::{FrameOutcome, SessionSnapshot, SessionState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const EVENT_CAPACITY: usize = 256;

#[derive(Default)]
struct IngestHandle {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

/// Owns one exercise session at a time: routes frames into the recording and
/// posture monitor, scores the closed recording and persists the outcome.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    scorer: Arc<SessionScorer>,
    db: Database,
    events: broadcast::Sender<SessionEvent>,
    ingest: Arc<Mutex<IngestHandle>>,
    scoring: Arc<Mutex<Option<CancellationToken>>>,
}

impl SessionController {
    pub fn new(db: Database, scorer: SessionScorer, posture: PostureConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState::new(posture))),
            scorer: Arc::new(scorer),
            db,
            events,
            ingest: Arc::new(Mutex::new(IngestHandle::default())),
            scoring: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot(Instant::now())
    }

    pub async fn posture_report(&self) -> PostureReport {
        self.state.lock().await.posture_report()
    }

    /// Opens a session for `exercise_id` and starts draining `frames`.
    pub async fn start(
        &self,
        exercise_id: &str,
        frames: mpsc::Receiver<Frame>,
    ) -> Result<SessionSnapshot> {
        {
            let state = self.state.lock().await;
            if state.phase.is_live() {
                bail!("session already active");
            }
        }
        if self.scoring.lock().await.is_some() {
            bail!("previous session is still being scored");
        }

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let session = Session {
            id: session_id.clone(),
            exercise_id: exercise_id.to_string(),
            started_at,
            stopped_at: None,
            status: SessionStatus::Running,
            active_ms: 0,
            score: None,
            valid_frames: None,
            posture: PostureDurations::default(),
            created_at: started_at,
            updated_at: started_at,
        };
        self.db.insert_session(&session).await?;

        let snapshot = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            state.begin(session_id.clone(), exercise_id.to_string(), started_at, now);
            state.snapshot(now)
        };

        self.spawn_ingest(session_id.clone(), frames).await;

        log_info!("Started session {} for {}", session_id, exercise_id);
        self.emit(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    pub async fn pause(&self) -> Result<SessionSnapshot> {
        self.transition(|state, now| {
            if !state.phase.is_live() {
                bail!("no active session to pause");
            }
            state.pause(now);
            Ok(())
        })
        .await
    }

    pub async fn resume(&self) -> Result<SessionSnapshot> {
        self.transition(|state, now| {
            if !state.phase.is_live() {
                bail!("no paused session to resume");
            }
            state.resume(now);
            Ok(())
        })
        .await
    }

    /// Follows the reference video: frames are only recorded while it plays.
    pub async fn set_reference_clock(&self, running: bool) -> Result<SessionSnapshot> {
        self.transition(|state, _| {
            state.set_reference_clock(running);
            Ok(())
        })
        .await
    }

    pub async fn restart(&self) -> Result<SessionSnapshot> {
        self.transition(|state, now| {
            if !state.phase.is_live() {
                bail!("no active session to restart");
            }
            state.restart(now);
            Ok(())
        })
        .await
    }

    /// Routes one frame into the live session and publishes the posture update.
    pub async fn handle_frame(&self, frame: Frame, now: Instant) -> Option<FrameOutcome> {
        let outcome = self.state.lock().await.observe(frame, now)?;

        self.emit(SessionEvent::PostureUpdated(outcome.posture.clone()));
        if outcome.posture.alert_raised {
            if let Some(alert) = outcome.posture.alert.clone() {
                log_warn!("{}", alert.message);
                self.emit(SessionEvent::PostureAlert(alert));
            }
        }
        Some(outcome)
    }

    /// Closes the recording, scores it and stores the result.
    ///
    /// Returns `None` when no session was live or when [`cancel`](Self::cancel)
    /// interrupted scoring.
    pub async fn finish(&self) -> Result<Option<SessionSummary>> {
        let scoring_token = CancellationToken::new();
        let closed = {
            let mut state = self.state.lock().await;
            let Some(closed) = state.close(Instant::now()) else {
                return Ok(None);
            };
            *self.scoring.lock().await = Some(scoring_token.clone());
            closed
        };
        let stopped_at = Utc::now();

        self.stop_ingest().await?;

        let outcome = tokio::select! {
            biased;
            _ = scoring_token.cancelled() => None,
            result = self.scorer.evaluate(&closed.recording, &closed.exercise_id) => Some(result),
        };

        // Once the slot is cleared a cancel can no longer reach this session.
        let cancelled = {
            self.scoring.lock().await.take();
            scoring_token.is_cancelled()
        };

        let result = match outcome {
            Some(result) if !cancelled => result,
            _ => {
                log_info!("Scoring for session {} cancelled", closed.session_id);
                {
                    let mut state = self.state.lock().await;
                    if state.session_id.as_deref() == Some(closed.session_id.as_str()) {
                        state.discard();
                    }
                }
                self.db
                    .mark_session_status(
                        &closed.session_id,
                        SessionStatus::Cancelled,
                        closed.active_ms,
                        Some(stopped_at),
                        Utc::now(),
                    )
                    .await?;
                self.emit_state_changed().await;
                return Ok(None);
            }
        };

        let (score, valid_frames) = match result {
            Ok(report) => (report.score, report.valid_frames),
            Err(err) => {
                log_warn!(
                    "Could not score session {}: {}; scoring 0",
                    closed.session_id,
                    err
                );
                (0, 0)
            }
        };

        let summary = SessionSummary {
            id: closed.session_id,
            exercise_id: closed.exercise_id,
            started_at: closed.started_at,
            stopped_at,
            status: SessionStatus::Completed,
            active_ms: closed.active_ms,
            score,
            valid_frames,
            posture: closed.posture,
        };

        self.db
            .complete_session(&summary)
            .await
            .context("failed to persist finished session")?;

        log_info!(
            "Session {} finished with score {} over {} valid frames",
            summary.id,
            summary.score,
            summary.valid_frames
        );

        self.emit_state_changed().await;
        self.emit(SessionEvent::SessionCompleted(summary.clone()));
        Ok(Some(summary))
    }

    /// Score of the most recently closed recording, 0 when there is none.
    pub async fn score(&self) -> u8 {
        let closed = {
            let state = self.state.lock().await;
            state
                .closed_recording()
                .map(|(recording, exercise_id)| (recording, exercise_id.to_string()))
        };
        match closed {
            Some((recording, exercise_id)) => self.scorer.score(&recording, &exercise_id).await,
            None => 0,
        }
    }

    /// Stops ingest and any in-flight scoring and throws the recording away.
    ///
    /// Returns whether there was anything to cancel. Once `finish` has a score
    /// in hand the session can no longer be cancelled and this returns `false`.
    pub async fn cancel(&self) -> Result<bool> {
        let cancelled_at = Utc::now();
        let cancelled = {
            let mut state = self.state.lock().await;
            if !state.phase.is_live() {
                if let Some(token) = self.scoring.lock().await.as_ref() {
                    token.cancel();
                    return Ok(true);
                }
                None
            } else {
                state.sync_active(Instant::now());
                let session = state.session_id.clone().map(|id| (id, state.active_ms));
                state.discard();
                session
            }
        };

        let Some((session_id, active_ms)) = cancelled else {
            return Ok(false);
        };

        self.stop_ingest().await?;

        self.db
            .mark_session_status(
                &session_id,
                SessionStatus::Cancelled,
                active_ms,
                Some(cancelled_at),
                cancelled_at,
            )
            .await?;

        log_info!("Cancelled session {}", session_id);
        self.emit_state_changed().await;
        Ok(true)
    }

    async fn transition<F>(&self, apply: F) -> Result<SessionSnapshot>
    where
        F: FnOnce(&mut SessionState, Instant) -> Result<()>,
    {
        let snapshot = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            apply(&mut state, now)?;
            state.snapshot(now)
        };
        self.emit(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    async fn spawn_ingest(&self, session_id: String, frames: mpsc::Receiver<Frame>) {
        let mut ingest = self.ingest.lock().await;
        if let Some(token) = ingest.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = ingest.handle.take() {
            handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(ingest_loop(
            session_id,
            frames,
            self.clone(),
            cancel_token.clone(),
        ));

        ingest.handle = Some(handle);
        ingest.cancel_token = Some(cancel_token);
    }

    async fn stop_ingest(&self) -> Result<()> {
        let (token, handle) = {
            let mut ingest = self.ingest.lock().await;
            (ingest.cancel_token.take(), ingest.handle.take())
        };

        if let Some(token) = token {
            token.cancel();
        }

        if let Some(handle) = handle {
            handle.await.context("ingest task failed to join")
        } else {
            Ok(())
        }
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.snapshot().await;
        self.emit(SessionEvent::StateChanged(snapshot));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
