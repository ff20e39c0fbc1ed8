//! Per-line feature vectors.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::Line;

/// Body size assumed for documents without measurable text.
pub const DEFAULT_BODY_SIZE: f32 = 12.0;

/// Length of [`FeatureVector::to_array`].
pub const FEATURE_COUNT: usize = 11;

/// Feature names in [`FeatureVector::to_array`] order, as used by model
/// artifacts.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "relative_size",
    "is_bold",
    "y_norm",
    "char_len",
    "first_on_page",
    "word_count",
    "uppercase",
    "numbered",
    "ends_with_colon",
    "size_percentile",
    "sole_on_page",
];

/// Numeric encoding of one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Font size divided by the document's body size
    pub relative_size: f32,
    /// Dominant font is bold
    pub is_bold: bool,
    /// Top of the line as a fraction of the page height
    pub y_norm: f32,
    /// Characters in the trimmed text
    pub char_len: usize,
    /// First line of its page
    pub first_on_page: bool,
    /// Whitespace-separated words
    pub word_count: usize,
    /// All cased letters are upper case
    pub uppercase: bool,
    /// Starts with a section number ("2.1", "IV.", "Appendix B")
    pub numbered: bool,
    /// Ends with a colon
    pub ends_with_colon: bool,
    /// Fraction of lines in the document set in a smaller font
    pub size_percentile: f32,
    /// Only line of its page
    pub sole_on_page: bool,
}

impl FeatureVector {
    /// Flatten into model input order.
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.relative_size,
            flag(self.is_bold),
            self.y_norm,
            self.char_len as f32,
            flag(self.first_on_page),
            self.word_count as f32,
            flag(self.uppercase),
            flag(self.numbered),
            flag(self.ends_with_colon),
            self.size_percentile,
            flag(self.sole_on_page),
        ]
    }
}

/// Document-wide font statistics.
///
/// Relative sizes of every line are computed against the same body size.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStats {
    body_size: f32,
    sizes: Vec<f32>,
}

impl DocumentStats {
    /// Collect statistics over the given lines.
    ///
    /// The body size is the size covering the most characters, at 0.1pt
    /// resolution; ties go to the smaller size.
    pub fn from_lines(lines: &[&Line]) -> Self {
        let mut histogram: BTreeMap<i32, usize> = BTreeMap::new();
        for line in lines {
            if line.font_size > 0.0 {
                *histogram
                    .entry((line.font_size * 10.0).round() as i32)
                    .or_default() += line.char_count();
            }
        }

        let body_size = histogram
            .iter()
            .filter(|(_, &chars)| chars > 0)
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then(kb.cmp(ka)))
            .map(|(&key, _)| key as f32 / 10.0)
            .unwrap_or(DEFAULT_BODY_SIZE);

        let mut sizes: Vec<f32> = lines.iter().map(|l| l.font_size).collect();
        sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        Self { body_size, sizes }
    }

    /// Modal body-text size.
    pub fn body_size(&self) -> f32 {
        self.body_size
    }

    /// Size relative to the body size.
    pub fn relative_size(&self, size: f32) -> f32 {
        size / self.body_size
    }

    /// Fraction of lines set strictly smaller than `size`.
    pub fn percentile(&self, size: f32) -> f32 {
        if self.sizes.is_empty() {
            return 0.5;
        }
        let smaller = self.sizes.partition_point(|&s| s < size);
        smaller as f32 / self.sizes.len() as f32
    }
}

/// Computes feature vectors for the lines of a document.
pub struct FeatureExtractor {
    numbered: Regex,
}

impl FeatureExtractor {
    /// Create an extractor.
    pub fn new() -> Self {
        Self {
            numbered: Regex::new(
                r"(?i)^\s*(?:(?:\d+\.)+\d*|\d+[.)]?|[ivxlcdm]+[.)]|[a-z][.)]|(?:chapter|section|part|appendix)\s+[a-z0-9]+)(?:\s+\S|:|$)",
            )
            .expect("numbered heading pattern is valid"),
        }
    }

    /// Whether a text starts with a section number.
    pub fn is_numbered(&self, text: &str) -> bool {
        self.numbered.is_match(text)
    }

    /// Feature vectors for `lines`, which must be in reading order.
    pub fn extract(
        &self,
        lines: &[&Line],
        stats: &DocumentStats,
        page_height: impl Fn(u32) -> f32,
    ) -> Vec<FeatureVector> {
        let mut per_page: BTreeMap<u32, usize> = BTreeMap::new();
        for line in lines {
            *per_page.entry(line.page).or_default() += 1;
        }

        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let text = line.text.trim();
                let height = page_height(line.page);
                let first_on_page = i == 0 || lines[i - 1].page != line.page;
                let has_cased = text.chars().any(char::is_alphabetic);

                FeatureVector {
                    relative_size: stats.relative_size(line.font_size),
                    is_bold: line.is_bold,
                    y_norm: if height > 0.0 {
                        (line.position.y / height).clamp(0.0, 1.0)
                    } else {
                        0.0
                    },
                    char_len: line.char_count(),
                    first_on_page,
                    word_count: text.split_whitespace().count(),
                    uppercase: has_cased
                        && text.chars().count() > 2
                        && !text.chars().any(char::is_lowercase),
                    numbered: self.is_numbered(text),
                    ends_with_colon: text.ends_with(':'),
                    size_percentile: stats.percentile(line.font_size),
                    sole_on_page: per_page.get(&line.page) == Some(&1),
                }
            })
            .collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn line(text: &str, page: u32, size: f32, y: f32) -> Line {
        Line::new(text, page, size, false, Position::new(72.0, y), "Helvetica")
    }

    #[test]
    fn test_body_size_is_char_weighted_mode() {
        let lines = [
            line("A Big Title", 1, 24.0, 50.0),
            line("Plenty of body text on this line", 1, 11.0, 100.0),
            line("And more body text here", 1, 11.0, 115.0),
            line("Footnote", 1, 8.0, 700.0),
        ];
        let refs: Vec<&Line> = lines.iter().collect();
        let stats = DocumentStats::from_lines(&refs);
        assert_eq!(stats.body_size(), 11.0);
        assert!((stats.relative_size(22.0) - 2.0).abs() < 1e-6);
        assert_eq!(stats.percentile(24.0), 0.75);
        assert_eq!(stats.percentile(8.0), 0.0);
    }

    #[test]
    fn test_body_size_tie_prefers_smaller() {
        let lines = [line("abcd", 1, 14.0, 50.0), line("wxyz", 1, 10.0, 80.0)];
        let refs: Vec<&Line> = lines.iter().collect();
        assert_eq!(DocumentStats::from_lines(&refs).body_size(), 10.0);
        assert_eq!(DocumentStats::from_lines(&[]).body_size(), DEFAULT_BODY_SIZE);
    }

    #[test]
    fn test_feature_vector() {
        let lines = [
            line("1. INTRODUCTION", 1, 18.0, 79.2),
            line("Body text follows here", 1, 12.0, 120.0),
            line("Summary:", 2, 12.0, 396.0),
        ];
        let refs: Vec<&Line> = lines.iter().collect();
        let stats = DocumentStats::from_lines(&refs);
        let features = FeatureExtractor::new().extract(&refs, &stats, |_| 792.0);

        assert_eq!(features.len(), 3);
        let first = &features[0];
        assert!((first.relative_size - 1.5).abs() < 1e-6);
        assert!((first.y_norm - 0.1).abs() < 1e-6);
        assert!(first.first_on_page && first.uppercase && first.numbered);
        assert!(!first.sole_on_page);
        assert_eq!(first.word_count, 2);

        assert!(!features[1].first_on_page);
        assert!(features[2].first_on_page && features[2].sole_on_page);
        assert!(features[2].ends_with_colon);
        assert_eq!(features[2].to_array().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_numbered_patterns() {
        let extractor = FeatureExtractor::new();
        assert!(extractor.is_numbered("2.1 Scope"));
        assert!(extractor.is_numbered("3 Methods"));
        assert!(extractor.is_numbered("IV. Results"));
        assert!(extractor.is_numbered("Appendix B: Tables"));
        assert!(!extractor.is_numbered("Introduction"));
        assert!(!extractor.is_numbered("Revenue grew 12%"));
    }
}
