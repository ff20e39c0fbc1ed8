//! Extracted text lines and page geometry.

use serde::{Deserialize, Serialize};

/// A point on the page with a top-left origin (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Distance from the left edge in points
    pub x: f32,
    /// Distance from the top edge in points
    pub y: f32,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One visually distinct line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Concatenated text of the merged fragments
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Dominant font size in points
    pub font_size: f32,
    /// Whether the dominant font is bold
    pub is_bold: bool,
    /// Top-left corner of the line
    pub position: Position,
    /// Dominant font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl Line {
    /// Create a line.
    pub fn new(
        text: impl Into<String>,
        page: u32,
        font_size: f32,
        is_bold: bool,
        position: Position,
        font_name: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            page,
            font_size,
            is_bold,
            position,
            font_name: font_name.into(),
        }
    }

    /// Number of characters in the trimmed text.
    pub fn char_count(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// Page geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
}

impl PageInfo {
    /// Create page geometry.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
        }
    }

    /// US Letter page.
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }
}

/// All lines of one document plus the geometry of every page.
///
/// Pages without text still appear in `pages`, so boilerplate ratios are
/// computed against the real page count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedDocument {
    /// Every page, in page order
    pub pages: Vec<PageInfo>,
    /// Lines in reading order (page ascending, top to bottom)
    pub lines: Vec<Line>,
}

impl ExtractedDocument {
    /// Create an extracted document.
    pub fn new(pages: Vec<PageInfo>, lines: Vec<Line>) -> Self {
        Self { pages, lines }
    }

    /// Number of pages, including pages without text.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Geometry of a page by number.
    pub fn page(&self, number: u32) -> Option<&PageInfo> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Height of a page, defaulting to Letter when the page is unknown.
    pub fn page_height(&self, number: u32) -> f32 {
        self.page(number).map(|p| p.height).unwrap_or(792.0)
    }

    /// Check if the document has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_count_trims() {
        let line = Line::new("  Intro  ", 1, 12.0, false, Position::default(), "Helvetica");
        assert_eq!(line.char_count(), 5);
    }

    #[test]
    fn test_page_lookup() {
        let doc = ExtractedDocument::new(
            vec![PageInfo::letter(1), PageInfo::new(2, 595.0, 842.0)],
            vec![],
        );
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_height(2), 842.0);
        assert_eq!(doc.page_height(9), 792.0);
        assert!(doc.is_empty());
    }
}
