//! Seam to the hybrid (vector + keyword) search engine.
//!
//! The engine itself lives in the offline pipeline and is not part of this
//! crate; what it leaves behind is one ranked JSON artifact per topic. The
//! daemon and the batch job talk to [`HybridSearch`] so the live engine can
//! be slotted in, and [`ArtifactSearch`] serves its persisted output in the
//! meantime.

use crate::{errors::AppError, papers::PaperIndex};
use serde::{Deserialize, Serialize};

/// Paper fields carried by one search hit. Every field is optional; the
/// digest renders missing ones as "N/A".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperEntity {
    #[serde(default)]
    pub title_paper: Option<String>,
    #[serde(default)]
    pub novelty: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HitBody {
    #[serde(default)]
    pub entity: PaperEntity,
    #[serde(default)]
    pub score: Option<f32>,
}

/// One ranked result, shaped like the engine's output: the paper entity
/// nested under a `hit` envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub hit: HitBody,
}

pub trait HybridSearch: Send + Sync {
    fn search(&self, topic: &str, top_k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Read-through search over the artifact directory: the ranked array the
/// offline engine wrote, truncated to `top_k`. A missing artifact is a
/// cache miss, i.e. zero hits, exactly like the engine finding nothing.
pub struct ArtifactSearch {
    index: PaperIndex,
}

impl ArtifactSearch {
    pub fn new(index: PaperIndex) -> Self {
        ArtifactSearch { index }
    }
}

impl HybridSearch for ArtifactSearch {
    fn search(&self, topic: &str, top_k: usize) -> anyhow::Result<Vec<SearchHit>> {
        let value = match self.index.get(topic) {
            Ok(value) => value,
            Err(AppError::ArtifactMissing(_)) => {
                log::debug!("no search output for topic '{topic}'");
                return Ok(vec![]);
            }
            Err(err) => return Err(err.into()),
        };

        let mut hits: Vec<SearchHit> = serde_json::from_value(value)?;
        hits.truncate(top_k);
        Ok(hits)
    }
}
