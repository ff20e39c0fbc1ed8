//! The heading model interface and model loading.

use std::path::Path;
use std::sync::Arc;

use super::features::FeatureVector;
use super::linear::LinearModel;
use super::rules::RuleModel;
use crate::config::RuleThresholds;
use crate::model::HeadingLabel;

/// Output of a heading model for one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Highest-scoring label
    pub label: HeadingLabel,
    /// Score of `label`
    pub confidence: f32,
    /// Scores indexed by [`HeadingLabel::index`]
    pub scores: [f32; 4],
}

impl Prediction {
    /// Build a prediction from a score vector. Equal scores resolve to the
    /// label listed first in [`HeadingLabel::ALL`].
    pub fn from_scores(scores: [f32; 4]) -> Self {
        let mut best = 0;
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = i;
            }
        }
        Self {
            label: HeadingLabel::ALL[best],
            confidence: scores[best],
            scores,
        }
    }

    /// Score of a label.
    pub fn score(&self, label: HeadingLabel) -> f32 {
        self.scores[label.index()]
    }

    /// Second-highest-scoring label.
    pub fn runner_up(&self) -> HeadingLabel {
        HeadingLabel::ALL
            .iter()
            .copied()
            .filter(|&l| l != self.label)
            .fold(None, |best: Option<HeadingLabel>, l| match best {
                Some(b) if self.score(b) >= self.score(l) => Some(b),
                _ => Some(l),
            })
            .unwrap_or(HeadingLabel::None)
    }

    /// Whether the top two scores lie within `margin` of each other.
    pub fn is_ambiguous(&self, margin: f32) -> bool {
        self.confidence - self.score(self.runner_up()) < margin
    }
}

/// Maps a line's features to a heading label.
///
/// Implementations are immutable after loading and shared across worker
/// threads.
pub trait HeadingModel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Score a line.
    fn classify(&self, features: &FeatureVector) -> Prediction;
}

/// Location of the bundled classifier artifact, relative to the working
/// directory or the installed binary.
pub const DEFAULT_MODEL_PATH: &str = "models/heading_classifier.json";

/// Load the model artifact at `path`, falling back to the rule-based model
/// when no path is given or the artifact cannot be loaded.
///
/// Either fallback is a degraded mode and is logged as a warning.
pub fn load_model(path: Option<&Path>, rules: RuleThresholds) -> Arc<dyn HeadingModel> {
    let Some(path) = path else {
        log::warn!("No model artifact given; running on font-size rules only");
        return Arc::new(RuleModel::new(rules));
    };

    match LinearModel::from_file(path) {
        Ok(model) => {
            log::info!("Loaded heading model {} from {}", model.name(), path.display());
            Arc::new(model)
        }
        Err(e) => {
            log::warn!(
                "Failed to load model {}: {}; falling back to font-size rules",
                path.display(),
                e
            );
            Arc::new(RuleModel::new(rules))
        }
    }
}
