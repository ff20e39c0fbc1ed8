//! Title selection and outline assembly.

use std::cmp::Ordering;

use crate::classify::ClassifiedLine;
use crate::config::GateConfig;
use crate::model::{Document, OutlineEntry};
use crate::text::collapse_whitespace;

/// Page the title is taken from.
const TITLE_PAGE: u32 = 1;

/// Consecutive title lines may be at most this many font sizes apart.
const TITLE_LINE_GAP: f32 = 2.0;

/// Adjacent page-1 lines that share a font size and read as one unit.
#[derive(Debug)]
struct Block {
    /// Indices into the classified slice
    members: Vec<usize>,
    font_size: f32,
    relative_size: f32,
    is_heading: bool,
}

/// Builds the outline [`Document`] from classified lines.
#[derive(Debug, Clone, Default)]
pub struct OutlineAssembler {
    gate: GateConfig,
}

impl OutlineAssembler {
    /// Create an assembler; a title must clear the gate's size margin.
    pub fn new(gate: GateConfig) -> Self {
        Self { gate }
    }

    /// Pick the title and order the headings.
    ///
    /// Headings on page 1 are part of the outline unless their block is
    /// strictly larger than the other page-1 heading blocks and the next
    /// heading in the document, in which case it may become the title.
    pub fn assemble(&self, classified: &[ClassifiedLine<'_>]) -> Document {
        let blocks = title_page_blocks(classified);
        let title_block = self.title_block(&blocks, classified);

        let title = title_block
            .map(|block| {
                let parts: Vec<&str> = block
                    .members
                    .iter()
                    .map(|&i| classified[i].line.text.as_str())
                    .collect();
                collapse_whitespace(&parts.join(" "))
            })
            .unwrap_or_default();
        let taken: &[usize] = title_block.map(|b| b.members.as_slice()).unwrap_or(&[]);

        let mut headings: Vec<&ClassifiedLine<'_>> = classified
            .iter()
            .enumerate()
            .filter(|(i, c)| c.is_heading() && !taken.contains(i))
            .map(|(_, c)| c)
            .collect();
        headings.sort_by(|a, b| reading_order(a, b));
        headings.dedup_by(|b, a| {
            a.line.page == b.line.page && a.line.position == b.line.position
        });

        let outline = headings
            .into_iter()
            .map(|c| {
                OutlineEntry::new(c.label, collapse_whitespace(&c.line.text), c.line.page)
                    .at(c.line.position)
            })
            .collect();

        Document::new(title, outline)
    }

    fn title_block<'b>(
        &self,
        blocks: &'b [Block],
        classified: &[ClassifiedLine<'_>],
    ) -> Option<&'b Block> {
        let distinguished = distinguished_heading(blocks, classified);

        let threshold = 1.0 + self.gate.size_margin;
        blocks
            .iter()
            .filter(|b| !b.is_heading || distinguished.is_some_and(|d| std::ptr::eq(d, *b)))
            .filter(|b| b.relative_size >= threshold)
            .fold(None, |best: Option<&Block>, b| match best {
                Some(current) if current.font_size >= b.font_size => Some(current),
                _ => Some(b),
            })
    }
}

/// The page-1 heading block that reads as a title rather than a section.
///
/// It must be strictly larger than every other page-1 heading block and than
/// the first heading that follows it, wherever that heading is. Without any
/// other heading in the document there is nothing to stand out from.
fn distinguished_heading<'b>(
    blocks: &'b [Block],
    classified: &[ClassifiedLine<'_>],
) -> Option<&'b Block> {
    let heading_blocks: Vec<&Block> = blocks.iter().filter(|b| b.is_heading).collect();
    let largest = heading_blocks.iter().copied().find(|candidate| {
        heading_blocks
            .iter()
            .filter(|other| !std::ptr::eq(**other, *candidate))
            .all(|other| candidate.font_size > other.font_size)
    })?;

    let last = *largest.members.last()?;
    let others: Vec<&ClassifiedLine<'_>> = classified
        .iter()
        .enumerate()
        .filter(|(i, c)| c.is_heading() && !largest.members.contains(i))
        .map(|(_, c)| c)
        .collect();
    if others.is_empty() {
        return None;
    }

    let next = others
        .iter()
        .copied()
        .filter(|c| reading_order(c, &classified[last]) == Ordering::Greater)
        .min_by(|a, b| reading_order(a, b));
    match next {
        Some(next) if largest.font_size <= next.line.font_size => None,
        _ => Some(largest),
    }
}

/// Group the page-1 lines into blocks of adjacent same-size lines.
fn title_page_blocks(classified: &[ClassifiedLine<'_>]) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut previous: Option<usize> = None;

    for (i, c) in classified.iter().enumerate() {
        if c.line.page != TITLE_PAGE {
            continue;
        }

        let joins = previous.is_some_and(|p| {
            let prev = classified[p].line;
            (prev.font_size - c.line.font_size).abs() < 0.1
                && c.line.position.y - prev.position.y <= TITLE_LINE_GAP * c.line.font_size
                && c.is_heading() == classified[p].is_heading()
        });

        match blocks.last_mut() {
            Some(block) if joins => block.members.push(i),
            _ => blocks.push(Block {
                members: vec![i],
                font_size: c.line.font_size,
                relative_size: c.features.relative_size,
                is_heading: c.is_heading(),
            }),
        }
        previous = Some(i);
    }

    blocks
}

fn reading_order(a: &ClassifiedLine<'_>, b: &ClassifiedLine<'_>) -> Ordering {
    a.line
        .page
        .cmp(&b.line.page)
        .then(a.line.position.y.total_cmp(&b.line.position.y))
        .then(a.line.position.x.total_cmp(&b.line.position.x))
}
