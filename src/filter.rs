//! Running header and footer removal.
//!
//! A text that recurs in the top or bottom band of most pages is page
//! furniture, not content. Page numbers change on every page, so short
//! numeric labels are compared with their digits masked.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::config::BoilerplateConfig;
use crate::model::{ExtractedDocument, Line};
use crate::text::{digit_ratio, mask_digits, normalize};

/// Vertical band of a page where running headers and footers live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    /// Top margin
    Top,
    /// Bottom margin
    Bottom,
}

impl Band {
    /// Band containing a line, if any.
    pub fn of(line: &Line, page_height: f32, margin: f32) -> Option<Band> {
        if page_height <= 0.0 {
            return None;
        }
        let center = (line.position.y + line.font_size / 2.0) / page_height;
        if center < margin {
            Some(Band::Top)
        } else if center > 1.0 - margin {
            Some(Band::Bottom)
        } else {
            None
        }
    }
}

/// Texts flagged as boilerplate in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boilerplate {
    /// Normalized texts removed wherever they occur
    pub exact: BTreeSet<String>,
    /// Digit-masked page labels removed within their band
    pub labels: BTreeSet<(Band, String)>,
}

impl Boilerplate {
    /// Check if nothing was flagged.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.labels.is_empty()
    }

    /// Number of flagged patterns.
    pub fn len(&self) -> usize {
        self.exact.len() + self.labels.len()
    }
}

/// Detects and removes repeated header/footer lines.
pub struct BoilerplateFilter {
    config: BoilerplateConfig,
    page_label: Regex,
}

impl BoilerplateFilter {
    /// Create a filter.
    pub fn new(config: BoilerplateConfig) -> Self {
        Self {
            config,
            // Applied to normalized, digit-masked text: "page # of #", "- # -", "p. #", "#/#".
            page_label: Regex::new(
                r"^[-–—(\[]?\s*(?:page|pg\.?|p\.)?\s*#(?:\s*(?:of|/)\s*#)?\s*[-–—)\]]?$",
            )
            .expect("page label pattern is valid"),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &BoilerplateConfig {
        &self.config
    }

    /// Whether a normalized text looks like a page-number label.
    fn is_page_label(&self, normalized: &str) -> bool {
        if normalized.chars().count() > self.config.page_label_max_chars {
            return false;
        }
        digit_ratio(normalized) >= 0.5 || self.page_label.is_match(&mask_digits(normalized))
    }

    /// Find the boilerplate patterns of a document.
    pub fn detect(&self, doc: &ExtractedDocument) -> Boilerplate {
        let page_count = doc.page_count();
        if page_count < self.config.min_pages {
            return Boilerplate::default();
        }

        let mut exact_pages: BTreeMap<(Band, String), BTreeSet<u32>> = BTreeMap::new();
        let mut label_pages: BTreeMap<(Band, String), BTreeSet<u32>> = BTreeMap::new();

        for line in &doc.lines {
            let Some(band) = Band::of(line, doc.page_height(line.page), self.config.margin_band)
            else {
                continue;
            };
            let key = normalize(&line.text);
            if key.is_empty() {
                continue;
            }
            if self.is_page_label(&key) {
                label_pages
                    .entry((band, mask_digits(&key)))
                    .or_default()
                    .insert(line.page);
            }
            exact_pages.entry((band, key)).or_default().insert(line.page);
        }

        let recurring = |pages: &BTreeSet<u32>| {
            let count = pages.len() as u32;
            count >= self.config.min_pages
                && count as f32 >= self.config.page_ratio * page_count as f32
        };

        let mut found = Boilerplate::default();
        for ((_, text), pages) in exact_pages {
            if recurring(&pages) {
                log::debug!("Boilerplate text {:?} on {} pages", text, pages.len());
                found.exact.insert(text);
            }
        }
        for (key, pages) in label_pages {
            if recurring(&pages) {
                log::debug!("Page label {:?} in {:?} band on {} pages", key.1, key.0, pages.len());
                found.labels.insert(key);
            }
        }
        found
    }

    /// Whether a line matches a flagged pattern.
    pub fn is_boilerplate(&self, line: &Line, page_height: f32, found: &Boilerplate) -> bool {
        let key = normalize(&line.text);
        if found.exact.contains(&key) {
            return true;
        }
        if found.labels.is_empty() || !self.is_page_label(&key) {
            return false;
        }
        Band::of(line, page_height, self.config.margin_band)
            .is_some_and(|band| found.labels.contains(&(band, mask_digits(&key))))
    }

    /// Lines that survive filtering, in document order.
    pub fn retain<'a>(&self, doc: &'a ExtractedDocument) -> Vec<&'a Line> {
        let found = self.detect(doc);
        if found.is_empty() {
            return doc.lines.iter().collect();
        }

        let kept: Vec<&Line> = doc
            .lines
            .iter()
            .filter(|line| !self.is_boilerplate(line, doc.page_height(line.page), &found))
            .collect();
        log::debug!(
            "Removed {} boilerplate lines ({} patterns)",
            doc.lines.len() - kept.len(),
            found.len()
        );
        kept
    }
}

impl Default for BoilerplateFilter {
    fn default() -> Self {
        Self::new(BoilerplateConfig::default())
    }
}
