use std::path::PathBuf;

use thiserror::Error;

/// Why a frame did not make it into the session recording.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("recording is paused or the reference clock is stopped")]
    NotRecording,
    #[error("detection gap: {found} of 33 landmarks")]
    DetectionGap { found: usize },
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("no reference track for exercise '{exercise_id}'")]
    NotFound {
        exercise_id: String,
        path: Option<PathBuf>,
    },
    #[error("failed to read reference track {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reference track {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("nothing was recorded during the session")]
    EmptyRecording,
    #[error("reference unavailable: {0}")]
    ReferenceUnavailable(#[from] ReferenceError),
}
