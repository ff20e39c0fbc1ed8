//! Candidate gating and level assignment.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::features::{DocumentStats, FeatureExtractor, FeatureVector};
use super::model::{HeadingModel, Prediction};
use crate::config::{GateConfig, LevelConfig, OutlineConfig};
use crate::model::{ExtractedDocument, HeadingLabel, Line};

/// Relative font size → heading level assignments made so far in one
/// document.
///
/// The first level given to a size sticks: later headings whose relative
/// size lies within the tolerance of a pinned size reuse its level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelPins {
    tolerance: f32,
    pins: Vec<(f32, HeadingLabel)>,
}

impl LevelPins {
    /// Create an empty map.
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            pins: Vec::new(),
        }
    }

    /// Level pinned for a relative size, if any.
    pub fn get(&self, relative_size: f32) -> Option<HeadingLabel> {
        self.pins
            .iter()
            .filter(|(size, _)| (size - relative_size).abs() <= self.tolerance)
            .min_by(|(a, _), (b, _)| {
                (a - relative_size)
                    .abs()
                    .total_cmp(&(b - relative_size).abs())
            })
            .map(|&(_, level)| level)
    }

    /// Pin a level for a relative size unless one is already pinned.
    /// Returns the level in effect.
    pub fn pin(&mut self, relative_size: f32, level: HeadingLabel) -> HeadingLabel {
        if let Some(existing) = self.get(relative_size) {
            return existing;
        }
        log::debug!("Pinned relative size {:.3} to {}", relative_size, level);
        self.pins.push((relative_size, level));
        level
    }

    /// Whether `level` fits the ordering established so far: it is no
    /// coarser than the level of any larger pinned size and no finer than
    /// the level of any smaller one.
    pub fn is_consistent(&self, relative_size: f32, level: HeadingLabel) -> bool {
        let Some(depth) = level.depth() else {
            return true;
        };
        self.pins.iter().all(|&(size, pinned)| {
            let Some(pinned_depth) = pinned.depth() else {
                return true;
            };
            if size > relative_size {
                depth >= pinned_depth
            } else {
                depth <= pinned_depth
            }
        })
    }

    /// Number of pinned sizes.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Check if nothing is pinned yet.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// A line with its features and final label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine<'a> {
    /// The line
    pub line: &'a Line,
    /// Its features
    pub features: FeatureVector,
    /// Whether the line passed the candidate gate
    pub candidate: bool,
    /// Raw model output, for candidates only
    pub prediction: Option<Prediction>,
    /// Final label after confidence, tie-break and pinning
    pub label: HeadingLabel,
}

impl ClassifiedLine<'_> {
    /// Whether the final label is a heading level.
    pub fn is_heading(&self) -> bool {
        self.label.is_heading()
    }
}

/// Labels the lines of one document.
pub struct HeadingClassifier {
    model: Arc<dyn HeadingModel>,
    gate: GateConfig,
    levels: LevelConfig,
    extractor: FeatureExtractor,
}

impl HeadingClassifier {
    /// Create a classifier around a shared model.
    pub fn new(model: Arc<dyn HeadingModel>, config: &OutlineConfig) -> Self {
        Self {
            model,
            gate: config.gate.clone(),
            levels: config.levels.clone(),
            extractor: FeatureExtractor::new(),
        }
    }

    /// The model in use.
    pub fn model(&self) -> &dyn HeadingModel {
        self.model.as_ref()
    }

    /// Whether a line may be a heading at all.
    pub fn is_candidate(&self, line: &Line, features: &FeatureVector) -> bool {
        let len = features.char_len;
        if len < self.gate.min_chars || len > self.gate.max_chars {
            return false;
        }
        if !line.text.chars().any(char::is_alphabetic) {
            return false;
        }
        features.relative_size > 1.0 + self.gate.size_margin
            || features.is_bold
            || (features.sole_on_page && features.y_norm < self.gate.top_band)
    }

    /// Classify lines in reading order with a fresh pin map.
    pub fn classify<'a>(&self, lines: &[&'a Line], doc: &ExtractedDocument) -> Vec<ClassifiedLine<'a>> {
        let mut pins = LevelPins::new(self.levels.pin_tolerance);
        self.classify_with_pins(lines, doc, &mut pins)
    }

    /// Classify lines in reading order, threading the given pin map.
    pub fn classify_with_pins<'a>(
        &self,
        lines: &[&'a Line],
        doc: &ExtractedDocument,
        pins: &mut LevelPins,
    ) -> Vec<ClassifiedLine<'a>> {
        let stats = DocumentStats::from_lines(lines);
        let features = self
            .extractor
            .extract(lines, &stats, |page| doc.page_height(page));
        log::debug!(
            "Body size {:.1}pt, classifying {} lines with {}",
            stats.body_size(),
            lines.len(),
            self.model.name()
        );

        let mut pages_with_heading: BTreeSet<u32> = BTreeSet::new();
        let mut classified = Vec::with_capacity(lines.len());

        for (&line, features) in lines.iter().zip(features) {
            if !self.is_candidate(line, &features) {
                classified.push(ClassifiedLine {
                    line,
                    features,
                    candidate: false,
                    prediction: None,
                    label: HeadingLabel::None,
                });
                continue;
            }

            let first_on_page = pages_with_heading.insert(line.page);
            let prediction = self.model.classify(&features);
            let label = self.assign_level(&features, &prediction, first_on_page, pins);

            classified.push(ClassifiedLine {
                line,
                features,
                candidate: true,
                prediction: Some(prediction),
                label,
            });
        }

        classified
    }

    fn assign_level(
        &self,
        features: &FeatureVector,
        prediction: &Prediction,
        first_on_page: bool,
        pins: &mut LevelPins,
    ) -> HeadingLabel {
        if !prediction.label.is_heading() || prediction.confidence < self.levels.min_confidence {
            return HeadingLabel::None;
        }

        let size = features.relative_size;
        if let Some(pinned) = pins.get(size) {
            return pinned;
        }

        let mut level = prediction.label;
        if prediction.is_ambiguous(self.levels.tie_margin) {
            let runner_up = prediction.runner_up();
            if first_on_page {
                level = level.coarser(runner_up);
            } else if runner_up.is_heading()
                && !pins.is_consistent(size, level)
                && pins.is_consistent(size, runner_up)
            {
                level = runner_up;
            }
        }

        pins.pin(size, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RuleModel;
    use crate::model::{PageInfo, Position};

    /// Fixed-output model for exercising tie-breaks.
    struct Fixed(Prediction);

    impl HeadingModel for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn classify(&self, _features: &FeatureVector) -> Prediction {
            self.0
        }
    }

    /// Predictions keyed by relative size, largest threshold first.
    struct BySize(Vec<(f32, Prediction)>);

    impl HeadingModel for BySize {
        fn name(&self) -> &str {
            "by-size"
        }

        fn classify(&self, features: &FeatureVector) -> Prediction {
            self.0
                .iter()
                .find(|(min, _)| features.relative_size >= *min)
                .map(|&(_, p)| p)
                .unwrap_or_else(|| Prediction::from_scores([1.0, 0.0, 0.0, 0.0]))
        }
    }

    fn line(text: &str, page: u32, size: f32, bold: bool, y: f32) -> Line {
        Line::new(text, page, size, bold, Position::new(72.0, y), "Helvetica")
    }

    fn doc(pages: u32) -> ExtractedDocument {
        ExtractedDocument::new((1..=pages).map(PageInfo::letter).collect(), Vec::new())
    }

    fn rules() -> HeadingClassifier {
        HeadingClassifier::new(Arc::new(RuleModel::default()), &OutlineConfig::default())
    }

    fn body(page: u32, y: f32) -> Line {
        line("Ordinary body text runs across the whole line here.", page, 12.0, false, y)
    }

    #[test]
    fn test_pins() {
        let mut pins = LevelPins::new(0.02);
        assert_eq!(pins.pin(1.5, HeadingLabel::H1), HeadingLabel::H1);
        assert_eq!(pins.pin(1.51, HeadingLabel::H2), HeadingLabel::H1);
        assert_eq!(pins.get(1.6), None);
        assert_eq!(pins.len(), 1);

        pins.pin(1.2, HeadingLabel::H2);
        assert!(pins.is_consistent(1.3, HeadingLabel::H2));
        assert!(pins.is_consistent(1.3, HeadingLabel::H1));
        assert!(!pins.is_consistent(1.3, HeadingLabel::H3));
        assert!(!pins.is_consistent(1.8, HeadingLabel::H2));
        assert!(!pins.is_consistent(1.1, HeadingLabel::H1));
    }

    #[test]
    fn test_gate() {
        let classifier = rules();
        let lines = [
            line("Big Heading", 1, 18.0, false, 100.0),
            line("Bold label", 1, 12.0, true, 150.0),
            body(1, 200.0),
            line("12", 1, 18.0, true, 250.0),
            line("A.", 1, 18.0, true, 300.0),
        ];
        let refs: Vec<&Line> = lines.iter().collect();
        let out = classifier.classify(&refs, &doc(1));
        let candidates: Vec<bool> = out.iter().map(|c| c.candidate).collect();
        assert_eq!(candidates, vec![true, true, false, false, false]);
    }

    #[test]
    fn test_pinned_size_keeps_level() {
        // First 15pt line is ambiguous and first on its page: coarser wins.
        let tied = Prediction::from_scores([0.0, 0.44, 0.46, 0.1]);
        let classifier =
            HeadingClassifier::new(Arc::new(Fixed(tied)), &OutlineConfig::default());
        let lines = [
            line("Overview", 1, 15.0, true, 100.0),
            body(1, 150.0),
            line("Details", 1, 15.0, true, 200.0),
            body(1, 250.0),
            line("Appendix", 2, 15.0, true, 100.0),
            body(2, 150.0),
        ];
        let refs: Vec<&Line> = lines.iter().collect();
        let labels: Vec<HeadingLabel> = classifier
            .classify(&refs, &doc(2))
            .into_iter()
            .filter(|c| c.candidate)
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec![HeadingLabel::H1; 3]);
    }

    #[test]
    fn test_low_confidence_rejected() {
        let weak = Prediction::from_scores([0.2, 0.25, 0.25, 0.2]);
        let classifier =
            HeadingClassifier::new(Arc::new(Fixed(weak)), &OutlineConfig::default());
        let lines = [line("Heading", 1, 20.0, true, 100.0), body(1, 150.0)];
        let refs: Vec<&Line> = lines.iter().collect();
        assert!(classifier.classify(&refs, &doc(1)).iter().all(|c| !c.is_heading()));
    }

    #[test]
    fn test_rule_levels_by_size() {
        let classifier = rules();
        let mut lines = vec![
            line("Annual Report", 1, 24.0, true, 80.0),
            line("Market Overview", 1, 16.0, true, 130.0),
            line("Regional detail", 1, 14.0, false, 180.0),
        ];
        for i in 0..8 {
            lines.push(body(1, 220.0 + i as f32 * 14.0));
        }
        let refs: Vec<&Line> = lines.iter().collect();
        let out = classifier.classify(&refs, &doc(1));
        assert_eq!(out[0].label, HeadingLabel::H1);
        assert_eq!(out[1].label, HeadingLabel::H2);
        assert_eq!(out[2].label, HeadingLabel::H3);
        assert!(out[3..].iter().all(|c| c.label == HeadingLabel::None));
    }

    #[test]
    fn test_tie_switches_to_runner_up_against_pinned_order() {
        let model = BySize(vec![
            (1.6, Prediction::from_scores([0.05, 0.05, 0.85, 0.05])),
            (1.3, Prediction::from_scores([0.05, 0.05, 0.46, 0.44])),
            (1.1, Prediction::from_scores([0.05, 0.46, 0.05, 0.44])),
        ]);
        let classifier = HeadingClassifier::new(Arc::new(model), &OutlineConfig::default());
        let mut lines = vec![
            line("Results", 1, 20.0, true, 80.0),
            body(1, 120.0),
            // Top label H1 would sit above the larger H2; runner-up H3 fits.
            line("Regional figures", 1, 14.0, true, 160.0),
            body(1, 200.0),
            line("Outlook", 2, 20.0, true, 80.0),
            body(2, 120.0),
            // Top label H2 already fits between the pins and is kept.
            line("Assumptions", 2, 16.0, true, 160.0),
        ];
        for i in 0..6 {
            lines.push(body(2, 200.0 + i as f32 * 14.0));
        }
        let refs: Vec<&Line> = lines.iter().collect();
        let labels: Vec<(&str, HeadingLabel)> = classifier
            .classify(&refs, &doc(2))
            .into_iter()
            .filter(|c| c.candidate)
            .map(|c| (c.line.text.as_str(), c.label))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Results", HeadingLabel::H2),
                ("Regional figures", HeadingLabel::H3),
                ("Outlook", HeadingLabel::H2),
                ("Assumptions", HeadingLabel::H2),
            ]
        );
    }
}
