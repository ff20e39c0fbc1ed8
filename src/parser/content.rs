//! Content stream interpretation.
//!
//! Walks the text operators of a page and emits one [`TextRun`] per shown
//! string, positioned in top-left page coordinates.

use std::collections::HashMap;

use super::backend::{ContentOp, MediaBox, PageId, PdfBackend, PdfValue};
use crate::error::Result;
use crate::model::PageInfo;

/// Average glyph advance as a fraction of the font size. Widths from font
/// metrics are not consulted, so run extents are estimates.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// TJ adjustments beyond this (thousandths of an em) read as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A string shown by one text operator, with the text state active at the
/// time it was laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Decoded text
    pub text: String,
    /// Left edge, in points from the page's left edge
    pub x: f32,
    /// Baseline, in points from the page's top edge
    pub baseline: f32,
    /// Estimated advance width in points
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name
    pub font_name: String,
    /// Whether the font name marks a bold weight
    pub is_bold: bool,
}

impl TextRun {
    /// Create a run, deriving boldness from the font name and estimating
    /// the width from the character count.
    pub fn new(
        text: impl Into<String>,
        x: f32,
        baseline: f32,
        font_size: f32,
        font_name: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let font_name = font_name.into();
        let width = estimate_width(&text, font_size);
        Self {
            is_bold: is_bold_font(&font_name),
            text,
            x,
            baseline,
            width,
            font_size,
            font_name,
        }
    }

    /// Override the estimated width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// All text runs of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// Page geometry
    pub info: PageInfo,
    /// Runs in content-stream order
    pub runs: Vec<TextRun>,
}

impl PageContent {
    /// Create page content.
    pub fn new(info: PageInfo, runs: Vec<TextRun>) -> Self {
        Self { info, runs }
    }

    /// A page with no text (blank or image-only).
    pub fn blank(info: PageInfo) -> Self {
        Self::new(info, Vec::new())
    }
}

/// Whether a base font name denotes a bold face.
pub fn is_bold_font(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|w| lower.contains(w))
}

fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_GLYPH_WIDTH
}

/// Affine transform `[a b c d e f]` as used by PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

/// Text state tracked while walking a content stream.
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    leading: f32,
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            leading: 0.0,
            font_resource: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            in_text: false,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    /// Advance the text matrix by a distance in unscaled text space.
    fn advance(&mut self, tx: f32) {
        self.tm = Matrix::translation(tx, 0.0).then(&self.tm);
    }
}

/// Interprets the content stream of a single page.
pub struct ContentInterpreter<'a, B: PdfBackend> {
    backend: &'a B,
    page_id: PageId,
    media_box: MediaBox,
    fonts: HashMap<Vec<u8>, String>,
}

impl<'a, B: PdfBackend> ContentInterpreter<'a, B> {
    /// Prepare an interpreter for a page, loading its font table.
    pub fn new(backend: &'a B, page_id: PageId) -> Result<Self> {
        let fonts = backend
            .page_fonts(page_id)?
            .into_iter()
            .map(|f| (f.name, f.base_font))
            .collect();
        Ok(Self {
            backend,
            page_id,
            media_box: backend.media_box(page_id),
            fonts,
        })
    }

    /// Page geometry for the given page number.
    pub fn page_info(&self, number: u32) -> PageInfo {
        PageInfo::new(number, self.media_box.width(), self.media_box.height())
    }

    /// Decode the page's content stream and collect its text runs.
    pub fn run(&self) -> Result<Vec<TextRun>> {
        let data = self.backend.page_content(self.page_id)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let ops = self.backend.decode_content(&data)?;
        Ok(self.interpret(&ops))
    }

    fn interpret(&self, ops: &[ContentOp]) -> Vec<TextRun> {
        let mut state = TextState::default();
        let mut runs = Vec::new();

        for op in ops {
            match op.operator.as_str() {
                "q" => state.ctm_stack.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = state.ctm_stack.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" if op.operands.len() >= 6 => {
                    let m = Matrix::new(
                        op.number(0, 1.0),
                        op.number(1, 0.0),
                        op.number(2, 0.0),
                        op.number(3, 1.0),
                        op.number(4, 0.0),
                        op.number(5, 0.0),
                    );
                    state.ctm = m.then(&state.ctm);
                }
                "BT" => {
                    state.in_text = true;
                    state.tm = Matrix::IDENTITY;
                    state.tlm = Matrix::IDENTITY;
                }
                "ET" => state.in_text = false,
                "Tf" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        state.font_name = self
                            .fonts
                            .get(name)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                        state.font_resource = name.clone();
                    }
                    // A negative size mirrors glyphs; its magnitude is the size.
                    state.font_size = op.number(1, 12.0).abs();
                }
                "TL" => state.leading = op.number(0, 0.0),
                "Td" => state.move_line(op.number(0, 0.0), op.number(1, 0.0)),
                "TD" => {
                    let ty = op.number(1, 0.0);
                    state.leading = -ty;
                    state.move_line(op.number(0, 0.0), ty);
                }
                "Tm" if op.operands.len() >= 6 => {
                    state.tlm = Matrix::new(
                        op.number(0, 1.0),
                        op.number(1, 0.0),
                        op.number(2, 0.0),
                        op.number(3, 1.0),
                        op.number(4, 0.0),
                        op.number(5, 0.0),
                    );
                    state.tm = state.tlm;
                }
                "T*" => state.next_line(),
                "Tj" => {
                    if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                        let text = self.decode(&state, bytes);
                        self.show(&mut state, text, &mut runs);
                    }
                }
                "'" => {
                    state.next_line();
                    if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                        let text = self.decode(&state, bytes);
                        self.show(&mut state, text, &mut runs);
                    }
                }
                "\"" => {
                    state.next_line();
                    if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                        let text = self.decode(&state, bytes);
                        self.show(&mut state, text, &mut runs);
                    }
                }
                "TJ" => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        let text = self.decode_array(&state, items);
                        self.show(&mut state, text, &mut runs);
                    }
                }
                _ => {}
            }
        }

        runs
    }

    fn decode(&self, state: &TextState, bytes: &[u8]) -> String {
        self.backend
            .decode_text(self.page_id, &state.font_resource, bytes)
    }

    /// Join the strings of a TJ array, turning large negative adjustments
    /// into word spaces.
    fn decode_array(&self, state: &TextState, items: &[PdfValue]) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                PdfValue::Str(bytes) => combined.push_str(&self.decode(state, bytes)),
                other => {
                    let Some(adjustment) = other.as_number().map(|n| -n) else {
                        continue;
                    };
                    let needs_space = adjustment > TJ_SPACE_THRESHOLD
                        && combined
                            .chars()
                            .last()
                            .map(|c| !c.is_whitespace() && !is_spaceless_script_char(c))
                            .unwrap_or(false);
                    if needs_space {
                        combined.push(' ');
                    }
                }
            }
        }
        combined
    }

    fn show(&self, state: &mut TextState, text: String, runs: &mut Vec<TextRun>) {
        let advance = text.chars().count() as f32 * state.font_size * AVG_GLYPH_WIDTH;

        if state.in_text && !text.trim().is_empty() {
            let render = state.tm.then(&state.ctm);
            let font_size = state.font_size * render.vertical_scale();
            let x = render.e - self.media_box.left;
            let baseline = self.media_box.top - render.f;
            runs.push(
                TextRun::new(text, x, baseline, font_size, state.font_name.clone())
                    .with_width(advance * render.horizontal_scale()),
            );
        }

        state.advance(advance);
    }
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF      // CJK Unified Ideographs
        | 0x3400..=0x4DBF    // Extension A
        | 0x20000..=0x2EBEF  // Extensions B-F
        | 0x3040..=0x309F    // Hiragana
        | 0x30A0..=0x30FF    // Katakana
        | 0x3000..=0x303F    // CJK Symbols and Punctuation
    )
}

#[cfg(test)]
mod tests {
    use super::super::backend::BackendFontInfo;
    use super::*;
    use std::collections::BTreeMap;

    /// Backend serving a fixed operation list for a single page.
    struct ScriptedBackend {
        ops: Vec<ContentOp>,
    }

    impl PdfBackend for ScriptedBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }

        fn media_box(&self, _page: PageId) -> MediaBox {
            MediaBox::LETTER
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(vec![
                BackendFontInfo {
                    name: b"F1".to_vec(),
                    base_font: "Helvetica".to_string(),
                },
                BackendFontInfo {
                    name: b"F2".to_vec(),
                    base_font: "ABCDEF+Helvetica-Bold".to_string(),
                },
            ])
        }

        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(b"scripted".to_vec())
        }

        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(self.ops.clone())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).to_string()
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn name(s: &str) -> PdfValue {
        PdfValue::Name(s.as_bytes().to_vec())
    }

    fn string(s: &str) -> PdfValue {
        PdfValue::Str(s.as_bytes().to_vec())
    }

    fn run_ops(ops: Vec<ContentOp>) -> Vec<TextRun> {
        let backend = ScriptedBackend { ops };
        ContentInterpreter::new(&backend, (1, 0)).unwrap().run().unwrap()
    }

    #[test]
    fn test_positions_are_top_left() {
        let runs = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F2"), PdfValue::Integer(24)]),
            op("Td", vec![PdfValue::Integer(72), PdfValue::Integer(720)]),
            op("Tj", vec![string("Introduction")]),
            op("ET", vec![]),
        ]);

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Introduction");
        assert_eq!(runs[0].x, 72.0);
        assert_eq!(runs[0].baseline, 72.0);
        assert_eq!(runs[0].font_size, 24.0);
        assert!(runs[0].is_bold);
    }

    #[test]
    fn test_consecutive_tj_advance() {
        let runs = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(10)]),
            op("Td", vec![PdfValue::Integer(100), PdfValue::Integer(500)]),
            op("Tj", vec![string("abcd")]),
            op("Tj", vec![string("efgh")]),
            op("ET", vec![]),
        ]);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].x, 120.0);
        assert_eq!(runs[0].right(), runs[1].x);
    }

    #[test]
    fn test_tm_scaling_and_tstar() {
        let runs = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(1)]),
            op(
                "Tm",
                vec![
                    PdfValue::Integer(12),
                    PdfValue::Integer(0),
                    PdfValue::Integer(0),
                    PdfValue::Integer(12),
                    PdfValue::Integer(50),
                    PdfValue::Integer(700),
                ],
            ),
            op("TL", vec![PdfValue::Real(1.5)]),
            op("Tj", vec![string("first")]),
            op("T*", vec![]),
            op("Tj", vec![string("second")]),
            op("ET", vec![]),
        ]);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].font_size, 12.0);
        assert_eq!(runs[0].baseline, 92.0);
        assert_eq!(runs[1].x, 50.0);
        assert_eq!(runs[1].baseline, 110.0);
    }

    #[test]
    fn test_tj_array_word_spaces() {
        let runs = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(12)]),
            op(
                "TJ",
                vec![PdfValue::Array(vec![
                    string("Scope"),
                    PdfValue::Integer(-250),
                    string("of"),
                    PdfValue::Integer(-20),
                    string("Work"),
                ])],
            ),
            op("ET", vec![]),
        ]);

        assert_eq!(runs[0].text, "Scope ofWork");
    }

    #[test]
    fn test_negative_font_size_is_magnitude() {
        let runs = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F2"), PdfValue::Integer(-18)]),
            op("Td", vec![PdfValue::Integer(72), PdfValue::Integer(700)]),
            op("Tj", vec![string("Scope")]),
            op("Tj", vec![string(" of Work")]),
            op("ET", vec![]),
        ]);

        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|r| r.font_size == 18.0));
        assert!(runs[1].x > runs[0].x);

        let page = PageContent::new(PageInfo::letter(1), runs);
        let lines = crate::layout::page_lines(&page);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Scope of Work");
        assert_eq!(lines[0].font_size, 18.0);
    }

    #[test]
    fn test_text_outside_bt_is_ignored() {
        let runs = run_ops(vec![
            op("Tf", vec![name("F1"), PdfValue::Integer(12)]),
            op("Tj", vec![string("stray")]),
        ]);
        assert!(runs.is_empty());
    }

    #[test]
    fn test_bold_font_names() {
        assert!(is_bold_font("Arial-BoldMT"));
        assert!(is_bold_font("ABCDEF+Montserrat-SemiBold"));
        assert!(is_bold_font("Helvetica-Black"));
        assert!(!is_bold_font("Times-Roman"));
    }

    #[test]
    fn test_spaceless_scripts() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('の'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('a'));
    }
}
