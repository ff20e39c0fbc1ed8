//! Line extraction: turns per-page text runs into positioned lines.

mod columns;
mod lines;

use rayon::prelude::*;

use crate::model::{ExtractedDocument, Line};
use crate::parser::PageContent;

pub use columns::{detect_columns, Column};
pub use lines::page_lines;

/// Build the lines of every page, keeping page order.
///
/// Each page is independent, so pages may be processed in parallel without
/// affecting the result.
pub fn extract_lines(pages: &[PageContent], parallel: bool) -> ExtractedDocument {
    let per_page: Vec<Vec<Line>> = if parallel {
        pages.par_iter().map(page_lines).collect()
    } else {
        pages.iter().map(page_lines).collect()
    };

    let infos = pages.iter().map(|p| p.info).collect();
    let lines: Vec<Line> = per_page.into_iter().flatten().collect();
    log::debug!("Extracted {} lines from {} pages", lines.len(), pages.len());

    ExtractedDocument::new(infos, lines)
}
