//! Pipeline thresholds.
//!
//! Every threshold is a parameter rather than a constant so it can be tuned
//! against the scoring harness. A JSON file only needs the keys it overrides:
//!
//! ```json
//! { "boilerplate": { "page_ratio": 0.5 }, "gate": { "size_margin": 0.2 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// All pipeline thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Running header/footer detection
    pub boilerplate: BoilerplateConfig,
    /// Heading candidate gate
    pub gate: GateConfig,
    /// Level assignment, tie-breaking and pinning
    pub levels: LevelConfig,
    /// Cutoffs for the rule-based fallback model
    pub rules: RuleThresholds,
}

impl OutlineConfig {
    /// Create a configuration with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Set boilerplate options.
    pub fn with_boilerplate(mut self, boilerplate: BoilerplateConfig) -> Self {
        self.boilerplate = boilerplate;
        self
    }

    /// Set gate options.
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    /// Set level options.
    pub fn with_levels(mut self, levels: LevelConfig) -> Self {
        self.levels = levels;
        self
    }

    /// Set fallback rule thresholds.
    pub fn with_rules(mut self, rules: RuleThresholds) -> Self {
        self.rules = rules;
        self
    }

    /// Reject thresholds outside their meaningful ranges.
    pub fn validate(&self) -> Result<()> {
        let b = &self.boilerplate;
        if !(0.0..=1.0).contains(&b.page_ratio) {
            return Err(Error::InvalidConfig(format!(
                "boilerplate.page_ratio must be within [0, 1], got {}",
                b.page_ratio
            )));
        }
        if !(0.0..0.5).contains(&b.margin_band) {
            return Err(Error::InvalidConfig(format!(
                "boilerplate.margin_band must be within [0, 0.5), got {}",
                b.margin_band
            )));
        }
        if self.gate.size_margin < 0.0 {
            return Err(Error::InvalidConfig(
                "gate.size_margin must not be negative".to_string(),
            ));
        }
        if self.levels.tie_margin < 0.0 || self.levels.pin_tolerance < 0.0 {
            return Err(Error::InvalidConfig(
                "levels.tie_margin and levels.pin_tolerance must not be negative".to_string(),
            ));
        }
        let r = &self.rules;
        if r.h1_ratio < r.h2_ratio {
            return Err(Error::InvalidConfig(format!(
                "rules.h1_ratio ({}) must be at least rules.h2_ratio ({})",
                r.h1_ratio, r.h2_ratio
            )));
        }
        Ok(())
    }
}

/// Options for running header/footer detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilerplateConfig {
    /// Documents with fewer pages skip the filter
    pub min_pages: u32,

    /// Fraction of pages a text must recur on
    pub page_ratio: f32,

    /// Height of the top and bottom bands as a fraction of the page
    pub margin_band: f32,

    /// Longest text still treated as a page-number label
    pub page_label_max_chars: usize,
}

impl Default for BoilerplateConfig {
    fn default() -> Self {
        Self {
            min_pages: 3,
            page_ratio: 0.6,
            margin_band: 0.10,
            page_label_max_chars: 24,
        }
    }
}

impl BoilerplateConfig {
    /// Set the recurrence ratio.
    pub fn with_page_ratio(mut self, ratio: f32) -> Self {
        self.page_ratio = ratio;
        self
    }

    /// Set the minimum page count.
    pub fn with_min_pages(mut self, pages: u32) -> Self {
        self.min_pages = pages;
        self
    }

    /// Set the margin band height.
    pub fn with_margin_band(mut self, band: f32) -> Self {
        self.margin_band = band;
        self
    }
}

/// Options for the heading candidate gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Relative size must exceed `1 + size_margin`
    pub size_margin: f32,

    /// A sole line on its page must start above this page fraction
    pub top_band: f32,

    /// Shorter texts are never headings
    pub min_chars: usize,

    /// Longer texts are never headings
    pub max_chars: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            size_margin: 0.15,
            top_band: 0.4,
            min_chars: 3,
            max_chars: 200,
        }
    }
}

impl GateConfig {
    /// Set the size margin.
    pub fn with_size_margin(mut self, margin: f32) -> Self {
        self.size_margin = margin;
        self
    }

    /// Set the minimum text length.
    pub fn with_min_chars(mut self, chars: usize) -> Self {
        self.min_chars = chars;
        self
    }
}

/// Options for level assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Top-two score gap under which a prediction is ambiguous
    pub tie_margin: f32,

    /// Relative sizes closer than this share a pinned level
    pub pin_tolerance: f32,

    /// Headings predicted with less confidence are dropped
    pub min_confidence: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            tie_margin: 0.1,
            pin_tolerance: 0.02,
            min_confidence: 0.3,
        }
    }
}

impl LevelConfig {
    /// Set the tie margin.
    pub fn with_tie_margin(mut self, margin: f32) -> Self {
        self.tie_margin = margin;
        self
    }

    /// Set the minimum confidence.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = confidence;
        self
    }
}

/// Cutoffs used when no trained model is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Minimum relative size for H1
    pub h1_ratio: f32,

    /// Minimum relative size for H2
    pub h2_ratio: f32,

    /// Minimum size percentile for H1
    pub h1_percentile: f32,

    /// Minimum size percentile for H2
    pub h2_percentile: f32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            h1_ratio: 1.5,
            h2_ratio: 1.25,
            h1_percentile: 0.9,
            h2_percentile: 0.75,
        }
    }
}
