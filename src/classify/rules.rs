//! Font-size threshold model used when no trained artifact is available.

use super::features::FeatureVector;
use super::model::{HeadingModel, Prediction};
use crate::config::RuleThresholds;
use crate::model::HeadingLabel;

/// Relative sizes this close to a cutoff score as a near tie between the
/// two neighbouring levels.
const BOUNDARY_BAND: f32 = 0.05;

/// Longest line (in words) the rules accept as a third-level heading.
const MAX_H3_WORDS: usize = 12;

/// Assigns levels from relative font size and size percentile.
#[derive(Debug, Clone, Default)]
pub struct RuleModel {
    thresholds: RuleThresholds,
}

impl RuleModel {
    /// Create a rule model.
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    fn level(&self, f: &FeatureVector) -> HeadingLabel {
        let t = &self.thresholds;
        let rel = f.relative_size;

        // A lone emphasised line near the top of its page is a section opener.
        if f.sole_on_page && f.y_norm < 0.5 && (f.is_bold || rel > 1.0) {
            return HeadingLabel::H1;
        }
        if rel >= t.h1_ratio || (rel >= t.h2_ratio && f.size_percentile >= t.h1_percentile) {
            return HeadingLabel::H1;
        }
        if rel >= t.h2_ratio || (rel > 1.0 && f.is_bold && f.size_percentile >= t.h2_percentile) {
            return HeadingLabel::H2;
        }
        if (rel > 1.0 || f.is_bold) && f.word_count <= MAX_H3_WORDS {
            return HeadingLabel::H3;
        }
        HeadingLabel::None
    }

    /// The neighbouring level when the relative size sits on a cutoff.
    fn boundary_neighbour(&self, f: &FeatureVector, label: HeadingLabel) -> Option<HeadingLabel> {
        let t = &self.thresholds;
        let near = |cutoff: f32| (f.relative_size - cutoff).abs() < BOUNDARY_BAND;
        match label {
            HeadingLabel::H1 if near(t.h1_ratio) => Some(HeadingLabel::H2),
            HeadingLabel::H2 if near(t.h1_ratio) => Some(HeadingLabel::H1),
            HeadingLabel::H2 if near(t.h2_ratio) => Some(HeadingLabel::H3),
            HeadingLabel::H3 if near(t.h2_ratio) => Some(HeadingLabel::H2),
            _ => None,
        }
    }
}

impl HeadingModel for RuleModel {
    fn name(&self) -> &str {
        "rules"
    }

    fn classify(&self, features: &FeatureVector) -> Prediction {
        let label = self.level(features);
        let mut scores = [0.05; 4];

        match self.boundary_neighbour(features, label) {
            Some(neighbour) => {
                scores[label.index()] = 0.46;
                scores[neighbour.index()] = 0.44;
            }
            None => scores[label.index()] = 0.85,
        }

        Prediction::from_scores(scores)
    }
}
