//! Text normalization and similarity helpers shared by the filter, the
//! classifier and the scorer.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

/// Presentation-form ligatures expanded during normalization.
const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Collapse every whitespace run (including NBSP) into one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{00A0}')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Comparison key: NFC, ligatures expanded, case-folded, whitespace
/// collapsed.
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let mut expanded = String::with_capacity(composed.len());
    for c in composed.chars() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, replacement)) => expanded.push_str(replacement),
            None => expanded.push(c),
        }
    }
    collapse_whitespace(&expanded.to_lowercase())
}

/// Replace every run of ASCII digits with `#`.
pub fn mask_digits(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut in_digits = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            if !in_digits {
                masked.push('#');
            }
            in_digits = true;
        } else {
            masked.push(c);
            in_digits = false;
        }
    }
    masked
}

/// Fraction of non-whitespace characters that are digits.
pub fn digit_ratio(text: &str) -> f32 {
    let (digits, total) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(d, t), c| {
            (d + usize::from(c.is_ascii_digit()), t + 1)
        });
    if total == 0 {
        0.0
    } else {
        digits as f32 / total as f32
    }
}

/// Similarity of two heading texts in `[0, 1]`: 1.0 for equal normalized
/// text, 0.8 when one contains the other, otherwise word-set Jaccard.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let words_a: BTreeSet<&str> = a.split(' ').collect();
    let words_b: BTreeSet<&str> = b.split(' ').collect();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}
