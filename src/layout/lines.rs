//! Grouping text runs into lines.

use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

use super::columns::{detect_columns, Column};
use crate::model::{Line, Position};
use crate::parser::{is_spaceless_script_char, PageContent, TextRun};
use crate::text::collapse_whitespace;

/// Runs whose baselines differ by less than this fraction of the font size
/// share a line.
const BASELINE_TOLERANCE: f32 = 0.3;

/// A horizontal gap wider than this many font sizes ends a line.
const MAX_WORD_GAP: f32 = 3.0;

/// Build the lines of one page in reading order.
///
/// Lines of different columns are interleaved by baseline, left column
/// first. A line never spans a column gutter.
pub fn page_lines(page: &PageContent) -> Vec<Line> {
    let runs: Vec<&TextRun> = page.runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    if runs.is_empty() {
        return Vec::new();
    }

    let columns = detect_columns(&page.runs, page.info.width);
    log::debug!("Page {}: {} column(s)", page.info.number, columns.len());

    let mut per_column: Vec<Vec<&TextRun>> = vec![Vec::new(); columns.len().max(1)];
    for run in runs {
        let index = column_of(&columns, run);
        per_column[index].push(run);
    }

    let mut grouped: Vec<(usize, RunGroup<'_>)> = Vec::new();
    for (index, column_runs) in per_column.into_iter().enumerate() {
        grouped.extend(group_column(column_runs).into_iter().map(|g| (index, g)));
    }

    // Top to bottom, then left column first on the same baseline.
    grouped.sort_by(|(col_a, a), (col_b, b)| {
        a.baseline
            .partial_cmp(&b.baseline)
            .unwrap_or(Ordering::Equal)
            .then(col_a.cmp(col_b))
            .then(a.left().partial_cmp(&b.left()).unwrap_or(Ordering::Equal))
    });

    grouped
        .into_iter()
        .filter_map(|(_, group)| group.into_line(page.info.number))
        .collect()
}

fn column_of(columns: &[Column], run: &TextRun) -> usize {
    columns
        .iter()
        .position(|c| c.contains_run(run))
        .unwrap_or(0)
}

/// Runs that form one line.
#[derive(Debug)]
struct RunGroup<'a> {
    runs: Vec<&'a TextRun>,
    baseline: f32,
}

impl<'a> RunGroup<'a> {
    fn new(run: &'a TextRun) -> Self {
        Self {
            baseline: run.baseline,
            runs: vec![run],
        }
    }

    fn left(&self) -> f32 {
        self.runs.first().map(|r| r.x).unwrap_or(0.0)
    }

    /// Concatenate run texts, inserting a space where the horizontal gap
    /// between runs looks like a word break.
    fn text(&self) -> String {
        let mut text = String::new();
        let mut previous: Option<&TextRun> = None;

        for &run in &self.runs {
            if let Some(prev) = previous {
                let gap = run.x - prev.right();
                let chars = run.text.chars().count();
                let char_width = if chars > 0 && run.width > 0.0 {
                    run.width / chars as f32
                } else {
                    run.font_size * 0.5
                };

                let cjk_join = prev.text.chars().last().is_some_and(is_spaceless_script_char)
                    && run.text.chars().next().is_some_and(is_spaceless_script_char);
                let spaced = prev.text.ends_with(char::is_whitespace)
                    || run.text.starts_with(char::is_whitespace);

                if gap > char_width * 0.2 && !cjk_join && !spaced {
                    text.push(' ');
                }
            }
            text.push_str(&run.text);
            previous = Some(run);
        }

        collapse_whitespace(&text)
    }

    fn into_line(self, page: u32) -> Option<Line> {
        let text = self.text();
        if text.is_empty() {
            return None;
        }

        let font_size = weighted_mode(self.runs.iter().map(|r| (size_key(r.font_size), *r)))
            .map(|key| key as f32 / 10.0)?;
        let is_bold = weighted_mode(self.runs.iter().map(|r| (r.is_bold, *r)))?;
        let font_name = weighted_mode(self.runs.iter().map(|r| (r.font_name.clone(), *r)))?;

        let top = self
            .runs
            .iter()
            .map(|r| r.baseline - r.font_size)
            .fold(f32::INFINITY, f32::min)
            .max(0.0);

        Some(Line::new(
            text,
            page,
            font_size,
            is_bold,
            Position::new(self.left(), top),
            font_name,
        ))
    }
}

/// Font sizes are compared at 0.1pt resolution.
fn size_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

/// Most frequent key by number of runs; ties go to the key covering more
/// characters, then to the key seen first.
fn weighted_mode<'a, K: Ord>(items: impl Iterator<Item = (K, &'a TextRun)>) -> Option<K> {
    let mut tally: BTreeMap<K, (usize, usize, Reverse<usize>)> = BTreeMap::new();
    for (order, (key, run)) in items.enumerate() {
        let entry = tally.entry(key).or_insert((0, 0, Reverse(order)));
        entry.0 += 1;
        entry.1 += run.text.chars().count();
    }
    tally
        .into_iter()
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(key, _)| key)
}

/// Group the runs of one column into lines.
fn group_column(mut runs: Vec<&TextRun>) -> Vec<RunGroup<'_>> {
    runs.sort_by(|a, b| {
        a.baseline
            .partial_cmp(&b.baseline)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    // Bucket by baseline first, then cut each bucket at wide gaps.
    let mut rows: Vec<Vec<&TextRun>> = Vec::new();
    let mut row_baseline = f32::NAN;
    for run in runs {
        let tolerance = run.font_size * BASELINE_TOLERANCE;
        match rows.last_mut() {
            Some(row) if (run.baseline - row_baseline).abs() <= tolerance => row.push(run),
            _ => {
                row_baseline = run.baseline;
                rows.push(vec![run]);
            }
        }
    }

    let mut groups = Vec::new();
    for mut row in rows {
        row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        let mut row_groups: Vec<RunGroup<'_>> = Vec::new();
        for run in row {
            let joins = row_groups
                .last()
                .and_then(|g| g.runs.last())
                .is_some_and(|last| {
                    run.x - last.right() <= MAX_WORD_GAP * last.font_size.max(run.font_size)
                });
            match row_groups.last_mut() {
                Some(group) if joins => group.runs.push(run),
                _ => row_groups.push(RunGroup::new(run)),
            }
        }
        groups.extend(row_groups);
    }
    groups
}
