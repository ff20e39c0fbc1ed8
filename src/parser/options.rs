//! Extraction options.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for reading page content from a PDF.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode for individual pages
    pub error_mode: ErrorMode,

    /// Which pages to read
    pub pages: PageSelection,

    /// Whether to build lines for several pages in parallel
    pub parallel: bool,
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the document when any page cannot be read.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Skip pages that cannot be read.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            pages: PageSelection::All,
            parallel: true,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any page error
    Strict,
    /// Skip unreadable pages and continue
    #[default]
    Lenient,
}

/// Page selection (1-indexed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// An inclusive range of pages
    Range(RangeInclusive<u32>),
    /// Specific pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number is selected.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a selection string such as `"1-10"` or `"1,3,5-7"`.
    ///
    /// A single span stays a range of any length. A list may name at most
    /// [`MAX_LISTED_PAGES`] pages in total.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            let (start, end) = parse_span(s)?;
            return Ok(PageSelection::Range(start..=end));
        }

        let mut pages = Vec::new();
        for part in s.split(',').map(str::trim) {
            let (start, end) = parse_span(part)?;
            let count = (end - start) as usize + 1;
            if pages.len() + count > MAX_LISTED_PAGES {
                return Err(Error::InvalidPageRange(part.to_string()));
            }
            pages.extend(start..=end);
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

/// Upper bound on the pages a comma-separated list expands to.
pub const MAX_LISTED_PAGES: usize = 100_000;

/// Parse `"n"` or `"a-b"` into inclusive bounds.
fn parse_span(part: &str) -> Result<(u32, u32)> {
    match part.split_once('-') {
        Some((start, end)) => {
            let start = parse_page(start)?;
            let end = parse_page(end)?;
            if start > end {
                return Err(Error::InvalidPageRange(part.to_string()));
            }
            Ok((start, end))
        }
        None => {
            let page = parse_page(part)?;
            Ok((page, page))
        }
    }
}

fn parse_page(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(Error::InvalidPageRange(s.trim().to_string())),
        Ok(n) => Ok(n),
    }
}
