use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::models::Frame;

use super::loader::reference_file_name;

/// Builds a reference track from the landmarks detected on a guide video.
///
/// Run once per exercise ahead of time; the output is what
/// [`FileReferenceStore`](super::FileReferenceStore) serves back at scoring time.
#[derive(Debug, Clone)]
pub struct ReferenceRecorder {
    exercise_id: String,
    frames: Vec<Frame>,
}

impl ReferenceRecorder {
    pub fn new(exercise_id: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            frames: Vec::new(),
        }
    }

    /// Keeps the frame if the detector saw the whole skeleton.
    pub fn push(&mut self, frame: Frame) -> bool {
        if !frame.is_complete() {
            return false;
        }
        self.frames.push(frame);
        true
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Writes `<base>_landmarks.json` into `dir` and returns its path.
    pub fn write_to(mut self, dir: &Path) -> Result<PathBuf> {
        let file_name = reference_file_name(&self.exercise_id)
            .ok_or_else(|| anyhow!("exercise id '{}' has no base name", self.exercise_id))?;

        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create reference directory {}", dir.display()))?;

        self.frames
            .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        let serialized = serde_json::to_string_pretty(&self.frames)?;

        let path = dir.join(file_name);
        fs::write(&path, serialized)
            .with_context(|| format!("failed to write reference track to {}", path.display()))?;

        info!(
            "Wrote {} reference frames for {} to {}",
            self.frames.len(),
            self.exercise_id,
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Landmark, LANDMARK_COUNT};
    use crate::reference::{FileReferenceStore, ReferenceStore};

    #[tokio::test]
    async fn written_track_loads_back_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = ReferenceRecorder::new("Squat.mp4");
        for i in (0..5).rev() {
            let frame = Frame::new(
                i as f64 * 0.1,
                vec![Landmark::new(0.5, 0.5, 0.9); LANDMARK_COUNT],
            );
            assert!(recorder.push(frame));
        }
        assert!(!recorder.push(Frame::new(1.0, Vec::new())));

        let path = recorder.write_to(dir.path()).unwrap();
        assert!(path.ends_with("Squat_landmarks.json"));

        let frames = FileReferenceStore::new(dir.path())
            .load("Squat.mp4")
            .await
            .unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].timestamp, 0.0);
        assert!(frames.iter().all(Frame::is_complete));
    }
}
