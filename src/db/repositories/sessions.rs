use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{parse_datetime, parse_optional_datetime, parse_status, to_i64, to_score, to_u64},
    Database,
};
use crate::models::{Session, SessionStatus, SessionSummary};
use crate::posture::PostureDurations;

const SESSION_COLUMNS: &str = "id, exercise_id, started_at, stopped_at, status, active_ms, score, \
     valid_frames, upright_secs, tilted_secs, slumped_secs, absent_secs, created_at, updated_at";

fn row_to_session(row: &Row) -> Result<Session> {
    let started_at: String = row.get("started_at")?;
    let stopped_at: Option<String> = row.get("stopped_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let status: String = row.get("status")?;
    let active_ms: i64 = row.get("active_ms")?;
    let valid_frames: Option<i64> = row.get("valid_frames")?;

    Ok(Session {
        id: row.get("id")?,
        exercise_id: row.get("exercise_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        stopped_at: parse_optional_datetime(stopped_at, "stopped_at")?,
        status: parse_status(&status)?,
        active_ms: to_u64(active_ms, "active_ms")?,
        score: to_score(row.get("score")?)?,
        valid_frames: valid_frames
            .map(|v| to_u64(v, "valid_frames"))
            .transpose()?,
        posture: PostureDurations {
            upright: row.get("upright_secs")?,
            tilted: row.get("tilted_secs")?,
            slumped: row.get("slumped_secs")?,
            absent: row.get("absent_secs")?,
        },
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn insert_session(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, exercise_id, started_at, stopped_at, status, active_ms, score,
                                       valid_frames, upright_secs, tilted_secs, slumped_secs, absent_secs,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    record.id,
                    record.exercise_id,
                    record.started_at.to_rfc3339(),
                    record.stopped_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.status.as_str(),
                    to_i64(record.active_ms)?,
                    record.score,
                    record.valid_frames.map(to_i64).transpose()?,
                    record.posture.upright,
                    record.posture.tilted,
                    record.posture.slumped,
                    record.posture.absent,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .context("failed to insert session")?;
            Ok(())
        })
        .await
    }

    /// Stores the final score and posture totals of a finished session.
    pub async fn complete_session(&self, summary: &SessionSummary) -> Result<()> {
        let record = summary.clone();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET status = ?1,
                     stopped_at = ?2,
                     active_ms = ?3,
                     score = ?4,
                     valid_frames = ?5,
                     upright_secs = ?6,
                     tilted_secs = ?7,
                     slumped_secs = ?8,
                     absent_secs = ?9,
                     updated_at = ?10
                 WHERE id = ?11",
                params![
                    record.status.as_str(),
                    record.stopped_at.to_rfc3339(),
                    to_i64(record.active_ms)?,
                    record.score,
                    to_i64(record.valid_frames)?,
                    record.posture.upright,
                    record.posture.tilted,
                    record.posture.slumped,
                    record.posture.absent,
                    record.stopped_at.to_rfc3339(),
                    record.id,
                ],
            )
            .context("failed to complete session")?;
            Ok(())
        })
        .await
    }

    pub async fn mark_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
        active_ms: u64,
        stopped_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET status = ?1,
                     active_ms = ?2,
                     stopped_at = ?3,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    status.as_str(),
                    to_i64(active_ms)?,
                    stopped_at.map(|dt| dt.to_rfc3339()),
                    updated_at.to_rfc3339(),
                    session_id,
                ],
            )
            .context("failed to update session status")?;
            Ok(())
        })
        .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt
                .query_row(params![session_id], |row| Ok(row_to_session(row)))
                .optional()?;
            row.transpose()
        })
        .await
    }

    /// Finished sessions, most recent first.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions("WHERE status IN ('Completed', 'Interrupted') ORDER BY started_at DESC")
            .await
    }

    /// Sessions still marked running, i.e. left behind by a crash.
    pub async fn get_incomplete_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions("WHERE status = 'Running' ORDER BY started_at DESC")
            .await
    }

    /// Closes out a session that was still running when the process died.
    pub async fn mark_session_interrupted(
        &self,
        session_id: &str,
        interrupted_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET status = ?1,
                     stopped_at = COALESCE(stopped_at, ?2),
                     updated_at = ?2
                 WHERE id = ?3 AND status = ?4",
                params![
                    SessionStatus::Interrupted.as_str(),
                    interrupted_at.to_rfc3339(),
                    session_id,
                    SessionStatus::Running.as_str(),
                ],
            )
            .context("failed to mark session interrupted")?;
            Ok(())
        })
        .await
    }

    async fn query_sessions(&self, filter: &'static str) -> Result<Vec<Session>> {
        self.execute(move |conn| {
            let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions {filter}");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }
}
