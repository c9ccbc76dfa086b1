mod db;
pub mod error;
pub mod models;
pub mod posture;
pub mod recording;
pub mod reference;
pub mod scoring;
pub mod session;
mod settings;
mod utils;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::warn;

pub use db::Database;
pub use error::{RecordError, ReferenceError, ScoreError};
pub use models::{Frame, Landmark, Session, SessionStatus, SessionSummary, LANDMARK_COUNT};
pub use posture::{PostureConfig, PostureMonitor, PostureReport, PostureState};
pub use recording::LandmarkBuffer;
pub use reference::{FileReferenceStore, MemoryReferenceStore, ReferenceRecorder, ReferenceStore};
pub use scoring::{ScoreReport, ScoringConfig, SessionScorer, SimilarityStrategy};
pub use session::{SessionController, SessionEvent, SessionPhase, SessionSnapshot};
pub use settings::{EngineSettings, SettingsStore};
pub use utils::logging::init_logging;

/// Finalizes sessions that were still running when the process last died.
/// Returns how many were recovered.
pub async fn recover_interrupted_sessions(db: &Database) -> Result<usize> {
    let incomplete = db.get_incomplete_sessions().await?;
    let now = Utc::now();
    for session in &incomplete {
        warn!(
            "Recovered incomplete session {}; marking as Interrupted",
            session.id
        );
        db.mark_session_interrupted(&session.id, now).await?;
    }
    Ok(incomplete.len())
}

/// Everything a front end needs, wired from one data directory.
pub struct Engine {
    pub db: Database,
    pub settings: SettingsStore,
    pub controller: SessionController,
}

impl Engine {
    /// Opens `formcheck.sqlite3` and `settings.json` under `data_dir`, recovers
    /// interrupted sessions and serves reference tracks from `reference_dir`.
    pub async fn open(data_dir: &Path, reference_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join("formcheck.sqlite3"))?;
        let recovered = recover_interrupted_sessions(&db).await?;
        if recovered > 0 {
            log::info!("Recovered {recovered} interrupted session(s)");
        }

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let engine_settings = settings.settings()?;

        let store: Arc<dyn ReferenceStore> = Arc::new(FileReferenceStore::new(reference_dir));
        let scorer = SessionScorer::new(store, engine_settings.scoring);
        let controller = SessionController::new(db.clone(), scorer, engine_settings.posture);

        Ok(Self {
            db,
            settings,
            controller,
        })
    }
}
