//! Data model shared by every pipeline stage.
//!
//! Lines are produced once by the extractor and only read afterwards; the
//! outline [`Document`] is the single artifact written per input PDF.

mod line;
mod outline;

pub use line::{ExtractedDocument, Line, PageInfo, Position};
pub use outline::{Document, HeadingLabel, OutlineEntry};
