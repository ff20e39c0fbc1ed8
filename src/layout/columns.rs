//! Column gutter detection.

use crate::parser::TextRun;

/// Width of the vertical slices used to build the occupancy profile.
const SLICE_WIDTH: f32 = 3.0;

/// Narrower text blocks are never split into columns.
const MIN_SPLIT_WIDTH: f32 = 250.0;

/// Narrowest empty strip considered while scanning.
const CANDIDATE_GAP: f32 = 10.0;

/// Narrowest gutter accepted as a column separator.
const MIN_GUTTER: f32 = 12.0;

/// Narrowest column accepted on either side of a gutter.
const MIN_COLUMN_WIDTH: f32 = 80.0;

/// Column margin added beyond the outermost runs.
const EDGE_PAD: f32 = 10.0;

/// Largest page width the profile covers, the PDF user space limit.
const MAX_PAGE_WIDTH: f32 = 14_400.0;

/// A vertical text column on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Left boundary
    pub left: f32,
    /// Right boundary
    pub right: f32,
    /// Column index (0 = leftmost)
    pub index: usize,
}

impl Column {
    /// Whether an x coordinate falls within this column.
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x < self.right
    }

    /// Whether a run belongs to this column, judged by its horizontal center.
    pub fn contains_run(&self, run: &TextRun) -> bool {
        self.contains(run.x + run.width / 2.0)
    }
}

/// An empty stretch of slices in the occupancy profile.
#[derive(Debug, Clone, Copy, Default)]
struct Gap {
    start: usize,
    len: usize,
}

impl Gap {
    fn width(&self) -> f32 {
        self.len as f32 * SLICE_WIDTH
    }

    fn center(&self) -> usize {
        self.start + self.len / 2
    }

    /// Much wider gaps win outright; comparable ones win by being closer to
    /// the middle of the text block.
    fn beats(&self, best: Option<(Gap, usize)>, middle: usize) -> bool {
        if self.width() < CANDIDATE_GAP {
            return false;
        }
        let Some((best, best_dist)) = best else {
            return true;
        };
        let dist = self.center().abs_diff(middle);
        self.width() > best.width() * 1.5 || (self.width() >= best.width() * 0.7 && dist < best_dist)
    }
}

/// Split the runs of a page into at most two columns.
///
/// A gutter is the best empty vertical strip in the middle 70% of the text
/// block. It only counts when it is at least 12pt wide, both sides are at
/// least 80pt wide and each side holds a tenth of the runs.
///
/// Only the part of each run inside `[0, page_width]` is profiled. Runs
/// placed entirely off the page do not widen the text block.
pub fn detect_columns(runs: &[TextRun], page_width: f32) -> Vec<Column> {
    let limit = if page_width > 0.0 {
        page_width.min(MAX_PAGE_WIDTH)
    } else {
        MAX_PAGE_WIDTH
    };
    let spans: Vec<(f32, f32)> = runs
        .iter()
        .filter(|r| r.right() >= 0.0 && r.x <= limit)
        .map(|r| (r.x.clamp(0.0, limit), r.right().clamp(0.0, limit)))
        .collect();
    if spans.is_empty() {
        return Vec::new();
    }

    let min_x = spans.iter().map(|s| s.0).fold(f32::INFINITY, f32::min);
    let max_x = spans.iter().map(|s| s.1).fold(f32::NEG_INFINITY, f32::max);
    let single = vec![Column {
        left: min_x - EDGE_PAD,
        right: max_x + EDGE_PAD,
        index: 0,
    }];

    let extent = max_x - min_x;
    if extent < MIN_SPLIT_WIDTH {
        return single;
    }

    let slices = (extent / SLICE_WIDTH) as usize + 1;
    let mut occupancy = vec![0usize; slices];
    for &(left, right) in &spans {
        let first = ((left - min_x) / SLICE_WIDTH) as usize;
        let last = ((right - min_x) / SLICE_WIDTH) as usize;
        for slot in occupancy
            .iter_mut()
            .take(last.min(slices - 1) + 1)
            .skip(first)
        {
            *slot += 1;
        }
    }

    let middle = slices / 2;
    let mut best: Option<(Gap, usize)> = None;
    let mut current = Gap::default();
    let search = slices * 15 / 100..slices * 85 / 100;
    for i in search {
        if occupancy[i] == 0 {
            if current.len == 0 {
                current.start = i;
            }
            current.len += 1;
            continue;
        }
        if current.len > 0 && current.beats(best, middle) {
            best = Some((current, current.center().abs_diff(middle)));
        }
        current = Gap::default();
    }
    if current.len > 0 && current.beats(best, middle) {
        best = Some((current, current.center().abs_diff(middle)));
    }

    let Some((gap, _)) = best else {
        return single;
    };
    if gap.width() < MIN_GUTTER {
        log::debug!("Gutter of {:.1}pt too narrow, single column", gap.width());
        return single;
    }

    let gutter = min_x + (gap.start as f32 + gap.len as f32 / 2.0) * SLICE_WIDTH;
    if gutter - min_x < MIN_COLUMN_WIDTH || max_x - gutter < MIN_COLUMN_WIDTH {
        log::debug!("Column beside gutter at x={:.1} too narrow", gutter);
        return single;
    }

    let left_runs = spans.iter().filter(|s| (s.0 + s.1) / 2.0 < gutter).count();
    let right_runs = spans.len() - left_runs;
    let min_runs = (spans.len() / 10).max(2);
    if left_runs < min_runs || right_runs < min_runs {
        log::debug!(
            "Runs unbalanced around gutter ({} left, {} right), single column",
            left_runs,
            right_runs
        );
        return single;
    }

    log::debug!("Two columns split at x={:.1}", gutter);
    vec![
        Column {
            left: min_x - EDGE_PAD,
            right: gutter,
            index: 0,
        },
        Column {
            left: gutter,
            right: max_x + EDGE_PAD,
            index: 1,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_WIDTH: f32 = 612.0;

    fn run(text: &str, x: f32, baseline: f32) -> TextRun {
        TextRun::new(text, x, baseline, 10.0, "Helvetica")
    }

    fn two_column_page() -> Vec<TextRun> {
        let mut runs = Vec::new();
        for i in 0..10 {
            let y = 100.0 + i as f32 * 14.0;
            // 40 chars * 5pt = 200pt wide columns with a 40pt gutter
            runs.push(run(&"l".repeat(40), 50.0, y));
            runs.push(run(&"r".repeat(40), 290.0, y));
        }
        runs
    }

    #[test]
    fn test_column_contains() {
        let col = Column {
            left: 0.0,
            right: 100.0,
            index: 0,
        };
        assert!(col.contains(0.0));
        assert!(col.contains(99.9));
        assert!(!col.contains(100.0));
        assert!(col.contains_run(&run("abc", 90.0, 10.0)));
    }

    #[test]
    fn test_detects_two_columns() {
        let columns = detect_columns(&two_column_page(), PAGE_WIDTH);
        assert_eq!(columns.len(), 2);
        assert!(columns[0].right > 250.0 && columns[0].right < 290.0);
        assert_eq!(columns[1].index, 1);
    }

    #[test]
    fn test_full_width_text_is_single_column() {
        let runs: Vec<TextRun> = (0..10)
            .map(|i| run(&"w".repeat(90), 50.0, 100.0 + i as f32 * 14.0))
            .collect();
        assert_eq!(detect_columns(&runs, PAGE_WIDTH).len(), 1);
    }

    #[test]
    fn test_narrow_block_is_single_column() {
        let runs = vec![run("Title", 50.0, 100.0), run("x", 200.0, 100.0)];
        assert_eq!(detect_columns(&runs, PAGE_WIDTH).len(), 1);
        assert!(detect_columns(&[], PAGE_WIDTH).is_empty());
    }

    #[test]
    fn test_off_page_run_keeps_profile_on_page() {
        let mut runs = two_column_page();
        runs.push(run("stray", 1.0e13, 100.0));
        runs.push(run("stray", -1.0e13, 120.0));
        let columns = detect_columns(&runs, PAGE_WIDTH);
        assert_eq!(columns.len(), 2);
        assert!(columns[1].right <= PAGE_WIDTH + EDGE_PAD);
    }

    #[test]
    fn test_bogus_page_width_is_bounded() {
        let runs = vec![run("left", 72.0, 100.0), run("far", 1.0e13, 100.0)];
        let columns = detect_columns(&runs, f32::MAX);
        assert_eq!(columns.len(), 1);
        assert!(columns[0].right <= MAX_PAGE_WIDTH + EDGE_PAD);
    }
}
