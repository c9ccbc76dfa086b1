use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::ReferenceError;
use crate::models::Frame;

/// Source of pre-recorded reference tracks, keyed by exercise identifier.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Frames of the reference track, sorted by timestamp.
    async fn load(&self, exercise_id: &str) -> Result<Vec<Frame>, ReferenceError>;
}

/// `"Lunge.mp4"` -> `"Lunge_landmarks.json"`.
///
/// The base name is everything before the first `.`; `None` when that is empty.
pub fn reference_file_name(exercise_id: &str) -> Option<String> {
    let base = exercise_id.split('.').next().unwrap_or_default().trim();
    if base.is_empty() {
        None
    } else {
        Some(format!("{base}_landmarks.json"))
    }
}

fn sort_by_timestamp(frames: &mut [Frame]) {
    frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}

/// Reference tracks stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileReferenceStore {
    root: PathBuf,
}

impl FileReferenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, exercise_id: &str) -> Option<PathBuf> {
        reference_file_name(exercise_id).map(|name| self.root.join(name))
    }
}

#[async_trait]
impl ReferenceStore for FileReferenceStore {
    async fn load(&self, exercise_id: &str) -> Result<Vec<Frame>, ReferenceError> {
        let path = self.path_for(exercise_id).ok_or_else(|| ReferenceError::NotFound {
            exercise_id: exercise_id.to_string(),
            path: None,
        })?;

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ReferenceError::NotFound {
                    exercise_id: exercise_id.to_string(),
                    path: Some(path),
                })
            }
            Err(source) => return Err(ReferenceError::Read { path, source }),
        };

        let mut frames: Vec<Frame> = serde_json::from_str(&contents)
            .map_err(|source| ReferenceError::Parse { path, source })?;
        sort_by_timestamp(&mut frames);
        Ok(frames)
    }
}

/// Reference tracks held in memory, for embedders that ship tracks themselves.
#[derive(Debug, Default)]
pub struct MemoryReferenceStore {
    tracks: RwLock<HashMap<String, Vec<Frame>>>,
}

impl MemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a track under the same base name the file store would use.
    pub fn insert(&self, exercise_id: &str, mut frames: Vec<Frame>) {
        sort_by_timestamp(&mut frames);
        let key = reference_file_name(exercise_id).unwrap_or_default();
        self.tracks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, frames);
    }
}

#[async_trait]
impl ReferenceStore for MemoryReferenceStore {
    async fn load(&self, exercise_id: &str) -> Result<Vec<Frame>, ReferenceError> {
        let not_found = || ReferenceError::NotFound {
            exercise_id: exercise_id.to_string(),
            path: None,
        };
        let key = reference_file_name(exercise_id).ok_or_else(not_found)?;
        self.tracks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned()
            .ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Landmark;

    #[test]
    fn derives_file_name_from_exercise_base_name() {
        assert_eq!(
            reference_file_name("Lunge.mp4").as_deref(),
            Some("Lunge_landmarks.json")
        );
        assert_eq!(
            reference_file_name("squat").as_deref(),
            Some("squat_landmarks.json")
        );
        assert_eq!(
            reference_file_name("arm.curl.v2.mp4").as_deref(),
            Some("arm_landmarks.json")
        );
        assert_eq!(reference_file_name(".mp4"), None);
    }

    #[tokio::test]
    async fn file_store_reports_missing_track_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReferenceStore::new(dir.path());
        let err = store.load("Plank.mp4").await.unwrap_err();
        assert!(matches!(err, ReferenceError::NotFound { path: Some(_), .. }));
    }

    #[tokio::test]
    async fn file_store_sorts_frames_and_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"[
            {"timestamp": 0.2, "landmarks": [{"x": 0.1, "y": 0.1, "visibility": 1.0}]},
            {"timestamp": 0.1, "landmarks": [{"x": 0.2, "y": 0.2, "z": 0.0, "visibility": 1.0}]}
        ]"#;
        std::fs::write(dir.path().join("Squat_landmarks.json"), json).unwrap();
        std::fs::write(dir.path().join("Broken_landmarks.json"), "{not json").unwrap();

        let store = FileReferenceStore::new(dir.path());
        let frames = store.load("Squat.mp4").await.unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp, 0.1);

        let err = store.load("Broken.mp4").await.unwrap_err();
        assert!(matches!(err, ReferenceError::Parse { .. }));
    }

    #[tokio::test]
    async fn memory_store_matches_by_base_name() {
        let store = MemoryReferenceStore::new();
        store.insert(
            "Lunge.mp4",
            vec![Frame::new(0.5, vec![Landmark::new(0.0, 0.0, 1.0)])],
        );
        assert_eq!(store.load("Lunge.webm").await.unwrap().len(), 1);
        assert!(store.load("Squat.mp4").await.is_err());
    }
}
