//! In-memory PDF fixtures built with lopdf's writer.

#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// One single-run line of text; `baseline` is measured from the page top.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub size: f32,
    pub bold: bool,
}

pub fn text(text: &str, baseline: f32, size: f32, bold: bool) -> TextLine {
    TextLine {
        text: text.to_string(),
        x: 72.0,
        baseline,
        size,
        bold,
    }
}

/// Several lines of ordinary 11pt prose starting at `baseline`.
pub fn body(baseline: f32, count: usize) -> Vec<TextLine> {
    (0..count)
        .map(|i| {
            text(
                "The committee reviewed the proposal and agreed on the next steps.",
                baseline + i as f32 * 14.0,
                11.0,
                false,
            )
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct PdfBuilder {
    pages: Vec<Vec<TextLine>>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, lines: Vec<TextLine>) -> Self {
        self.pages.push(lines);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in &self.pages {
            let mut operations = Vec::new();
            for line in lines {
                let font = if line.bold { "F2" } else { "F1" };
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
                operations.push(Operation::new(
                    "Td",
                    vec![line.x.into(), (PAGE_HEIGHT - line.baseline).into()],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(line.text.clone())],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content encodes"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("document saves");
        buffer
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.build()).expect("fixture written");
    }
}

/// A five-page report: one bold chapter heading per page, body text, and a
/// "Page X of 5" footer.
pub fn report_with_footers() -> PdfBuilder {
    (1..=5).fold(PdfBuilder::new(), |builder, page| {
        let mut lines = vec![text(&format!("Chapter {}", page), 100.0, 20.0, true)];
        lines.extend(body(140.0, 8));
        lines.push(text(&format!("Page {} of 5", page), 770.0, 9.0, false));
        builder.page(lines)
    })
}
