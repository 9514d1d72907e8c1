//! Read-through lookup over the per-topic JSON artifacts produced by the
//! offline search pipeline.
//!
//! There is no computation here: a topic maps to `<slug>.json` inside one
//! fixed directory, and the file body is returned as parsed JSON, verbatim.

use crate::errors::AppError;
use std::path::PathBuf;

/// Filename-safe form of a topic. Anything outside `[A-Za-z0-9._-]`
/// becomes a dash, so "3D Object Detection" resolves to
/// `3D-Object-Detection.json` and a topic can never climb out of the
/// artifact directory.
pub fn slug(topic: &str) -> String {
    topic
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PaperIndex {
    dir: PathBuf,
}

impl PaperIndex {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(PaperIndex { dir })
    }

    pub fn artifact_path(&self, topic: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slug(topic)))
    }

    /// Fetch the artifact for `topic`.
    ///
    /// `ArtifactMissing` if no file exists, `Json` if the file is not
    /// well-formed JSON.
    pub fn get(&self, topic: &str) -> Result<serde_json::Value, AppError> {
        let path = self.artifact_path(topic);
        if std::fs::metadata(&path).is_err() {
            return Err(AppError::ArtifactMissing(topic.to_string()));
        }

        let raw = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
