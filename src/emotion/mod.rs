//! Emotion annotation of user text
//!
//! The classifier itself is an external model reached through
//! [`EmotionClassifier`]. [`EmotionAnnotator`] adds the parts this crate
//! owns: ranking, top-k truncation, a deadline, and turning every failure
//! into "no emotion detected".

pub mod huggingface;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::bounded::bounded;

pub use huggingface::HuggingFaceClassifier;

/// Number of emotions kept for the prompt annotation
pub const DEFAULT_TOP_K: usize = 2;

/// One classified emotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
}

impl EmotionScore {
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Text classification capability returning every label it knows
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify `text`, in any order
    ///
    /// # Errors
    ///
    /// Returns error if the model cannot be reached or answers garbage
    async fn classify(&self, text: &str) -> Result<Vec<EmotionScore>>;
}

/// Sort by descending confidence and keep the first `k`
///
/// Scores that are not finite are dropped and the rest clamped to `[0, 1]`.
/// Ties keep their original relative order.
#[must_use]
pub fn rank_top(scores: Vec<EmotionScore>, k: usize) -> Vec<EmotionScore> {
    let mut ranked: Vec<EmotionScore> = scores
        .into_iter()
        .filter(|s| s.confidence.is_finite())
        .map(|mut s| {
            s.confidence = s.confidence.clamp(0.0, 1.0);
            s
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(k);
    ranked
}

/// Ranked, bounded, failure-tolerant wrapper around a classifier
#[derive(Clone)]
pub struct EmotionAnnotator {
    classifier: Option<Arc<dyn EmotionClassifier>>,
    top_k: usize,
    timeout: Duration,
}

impl EmotionAnnotator {
    #[must_use]
    pub fn new(classifier: Arc<dyn EmotionClassifier>, top_k: usize, timeout: Duration) -> Self {
        Self {
            classifier: Some(classifier),
            top_k,
            timeout,
        }
    }

    /// Annotator that never detects anything (no classifier configured)
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            classifier: None,
            top_k: DEFAULT_TOP_K,
            timeout: Duration::from_secs(0),
        }
    }

    /// Whether a classifier is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classify `text` and return the top emotions, highest first
    ///
    /// Blank input, a missing classifier, an empty model answer, a timeout,
    /// or any service error all yield an empty list.
    pub async fn classify(&self, text: &str) -> Vec<EmotionScore> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let Some(classifier) = &self.classifier else {
            return Vec::new();
        };

        match bounded("emotion classification", self.timeout, classifier.classify(text)).await {
            Ok(scores) => {
                let top = rank_top(scores, self.top_k);
                if top.is_empty() {
                    tracing::debug!("classifier returned no emotions");
                }
                for emotion in &top {
                    tracing::info!(
                        label = %emotion.label,
                        confidence = %format!("{:.2}", emotion.confidence),
                        "detected emotion"
                    );
                }
                top
            }
            Err(e) => {
                tracing::warn!(error = %e, "emotion classification failed, skipping annotation");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for EmotionAnnotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionAnnotator")
            .field("enabled", &self.is_enabled())
            .field("top_k", &self.top_k)
            .field("timeout", &self.timeout)
            .finish()
    }
}
