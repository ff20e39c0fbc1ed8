//! Heading labels and the outline document written per PDF.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Position;
use crate::error::Error;

/// Classification of a line: not a heading, or one of three heading levels.
///
/// H1 is the coarsest level; `NONE` never appears in an outline. Compare
/// levels through [`HeadingLabel::depth`] or [`HeadingLabel::coarser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeadingLabel {
    /// Ordinary text
    None,
    /// Top-level heading
    H1,
    /// Second-level heading
    H2,
    /// Third-level heading
    H3,
}

impl HeadingLabel {
    /// All labels in score-vector order.
    pub const ALL: [HeadingLabel; 4] = [
        HeadingLabel::None,
        HeadingLabel::H1,
        HeadingLabel::H2,
        HeadingLabel::H3,
    ];

    /// Position of this label in a score vector.
    pub fn index(self) -> usize {
        match self {
            HeadingLabel::None => 0,
            HeadingLabel::H1 => 1,
            HeadingLabel::H2 => 2,
            HeadingLabel::H3 => 3,
        }
    }

    /// Whether this label marks a heading.
    pub fn is_heading(self) -> bool {
        self != HeadingLabel::None
    }

    /// Numeric depth (1 for H1), or `None` for ordinary text.
    pub fn depth(self) -> Option<u8> {
        match self {
            HeadingLabel::None => None,
            HeadingLabel::H1 => Some(1),
            HeadingLabel::H2 => Some(2),
            HeadingLabel::H3 => Some(3),
        }
    }

    /// Label for a depth, clamping anything deeper than 3 to H3.
    pub fn from_depth(depth: u8) -> Self {
        match depth {
            0 => HeadingLabel::None,
            1 => HeadingLabel::H1,
            2 => HeadingLabel::H2,
            _ => HeadingLabel::H3,
        }
    }

    /// The coarser of two heading labels. Ordinary text is never coarser
    /// than a heading.
    pub fn coarser(self, other: HeadingLabel) -> HeadingLabel {
        match (self.depth(), other.depth()) {
            (Some(a), Some(b)) if b < a => other,
            (Some(_), _) => self,
            (None, _) => other,
        }
    }

    /// Label name as written in outline JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLabel::None => "NONE",
            HeadingLabel::H1 => "H1",
            HeadingLabel::H2 => "H2",
            HeadingLabel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeadingLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(HeadingLabel::None),
            "H1" => Ok(HeadingLabel::H1),
            "H2" => Ok(HeadingLabel::H2),
            "H3" => Ok(HeadingLabel::H3),
            other => Err(Error::Other(format!("unknown heading label: {}", other))),
        }
    }
}

/// A single heading in the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level (never `NONE`)
    pub level: HeadingLabel,

    /// Heading text
    pub text: String,

    /// Page number (1-indexed)
    pub page: u32,

    /// Where the heading line sits on its page; not part of the JSON schema
    #[serde(skip)]
    pub position: Option<Position>,
}

impl OutlineEntry {
    /// Create a new outline entry without position information.
    pub fn new(level: HeadingLabel, text: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            text: text.into(),
            page,
            position: None,
        }
    }

    /// Attach the on-page position of the heading line.
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// The outline of one PDF: a title and its headings in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document title (empty when nothing on page 1 stands out)
    #[serde(default)]
    pub title: String,

    /// Headings in reading order
    #[serde(default)]
    pub outline: Vec<OutlineEntry>,
}

impl Document {
    /// Create an outline document.
    pub fn new(title: impl Into<String>, outline: Vec<OutlineEntry>) -> Self {
        Self {
            title: title.into(),
            outline,
        }
    }

    /// An empty outline with no title.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if the outline has no headings.
    pub fn is_empty(&self) -> bool {
        self.outline.is_empty()
    }

    /// Number of headings at a level.
    pub fn count_level(&self, level: HeadingLabel) -> usize {
        self.outline.iter().filter(|e| e.level == level).count()
    }
}
