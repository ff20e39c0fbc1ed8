//! End-to-end outline inference on generated PDFs.

mod common;

use std::collections::BTreeMap;
use std::path::Path;

use common::{body, report_with_footers, text, PdfBuilder};
use pdf_outline::render::{to_json, JsonFormat};
use pdf_outline::{
    outline_bytes, Document, ExtractOptions, HeadingLabel, OutlineConfig, PageSelection, Pipeline,
};

fn assert_reading_order(doc: &Document, page_count: u32) {
    for entry in &doc.outline {
        assert!(entry.page >= 1 && entry.page <= page_count, "{:?}", entry);
    }
    for pair in doc.outline.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let ay = a.position.map(|p| p.y).unwrap_or_default();
        let by = b.position.map(|p| p.y).unwrap_or_default();
        assert!((a.page, ay) < (b.page, by), "{:?} before {:?}", a, b);
    }
}

#[test]
fn test_single_introduction_heading() {
    let pdf = PdfBuilder::new()
        .page(vec![text("Introduction", 100.0, 24.0, true)])
        .build();

    let doc = outline_bytes(&pdf).unwrap();
    assert_eq!(
        to_json(&doc, JsonFormat::Compact).unwrap(),
        r#"{"title":"","outline":[{"level":"H1","text":"Introduction","page":1}]}"#
    );
}

#[test]
fn test_page_footers_never_in_outline() {
    let pdf = report_with_footers().build();
    let doc = outline_bytes(&pdf).unwrap();

    assert!(doc.outline.iter().all(|e| !e.text.starts_with("Page")));
    let texts: Vec<&str> = doc.outline.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Chapter 1", "Chapter 2", "Chapter 3", "Chapter 4", "Chapter 5"]
    );
    assert_eq!(doc.count_level(HeadingLabel::H1), 5);
    assert_reading_order(&doc, 5);
}

#[test]
fn test_cover_page_title_above_later_chapters() {
    let mut cover = vec![text("Annual Report 2024", 120.0, 28.0, true)];
    cover.extend(body(200.0, 8));
    let mut builder = PdfBuilder::new().page(cover);
    for chapter in 1..=2 {
        let mut page = vec![text(&format!("Chapter {}", chapter), 100.0, 18.0, true)];
        page.extend(body(150.0, 8));
        builder = builder.page(page);
    }

    let doc = outline_bytes(&builder.build()).unwrap();
    assert_eq!(doc.title, "Annual Report 2024");
    let entries: Vec<(&str, u32)> = doc.outline.iter().map(|e| (e.text.as_str(), e.page)).collect();
    assert_eq!(entries, vec![("Chapter 1", 2), ("Chapter 2", 3)]);
}

#[test]
fn test_missing_model_uses_rules() {
    let pipeline = Pipeline::from_model_path(
        Some(Path::new("/nonexistent/heading_classifier.json")),
        OutlineConfig::default(),
    );
    assert_eq!(pipeline.model().name(), "rules");

    let doc = pipeline.process_bytes(&report_with_footers().build()).unwrap();
    assert!(!doc.outline.is_empty());
}

#[test]
fn test_output_is_byte_identical() {
    let pdf = report_with_footers().build();
    let parallel = Pipeline::with_rules();
    let sequential =
        Pipeline::with_rules().with_options(ExtractOptions::new().sequential());

    let first = to_json(&parallel.process_bytes(&pdf).unwrap(), JsonFormat::Pretty).unwrap();
    let second = to_json(&parallel.process_bytes(&pdf).unwrap(), JsonFormat::Pretty).unwrap();
    let third = to_json(&sequential.process_bytes(&pdf).unwrap(), JsonFormat::Pretty).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn test_page_selection() {
    let options = ExtractOptions::new().with_pages(PageSelection::parse("2-3").unwrap());
    let pipeline = Pipeline::with_rules().with_options(options);

    let doc = pipeline.process_bytes(&report_with_footers().build()).unwrap();
    let pages: Vec<u32> = doc.outline.iter().map(|e| e.page).collect();
    assert_eq!(pages, vec![2, 3]);
}

#[test]
fn test_levels_stay_pinned_to_sizes() {
    let mut first = vec![
        text("Operations Handbook", 80.0, 26.0, true),
        text("Scope", 140.0, 16.0, true),
    ];
    first.extend(body(170.0, 8));

    let section = |title: &str, subsection: &str| {
        let mut lines = vec![text(title, 90.0, 16.0, true)];
        lines.extend(body(120.0, 4));
        lines.push(text(subsection, 200.0, 13.0, true));
        lines.extend(body(230.0, 4));
        lines
    };

    let pdf = PdfBuilder::new()
        .page(first)
        .page(section("Staffing", "Shift rotation"))
        .page(section("Equipment", "Spare parts"))
        .build();
    let doc = outline_bytes(&pdf).unwrap();
    assert_eq!(doc.title, "Operations Handbook");

    let size_of = |text: &str| match text {
        "Shift rotation" | "Spare parts" => 13,
        _ => 16,
    };
    let mut levels: BTreeMap<u32, Vec<HeadingLabel>> = BTreeMap::new();
    for entry in &doc.outline {
        levels.entry(size_of(&entry.text)).or_default().push(entry.level);
    }

    let large = &levels[&16];
    assert_eq!(large.len(), 3);
    assert!(large.iter().all(|l| *l == large[0]));
    if let Some(small) = levels.get(&13) {
        assert!(small.iter().all(|l| *l == small[0]));
        assert!(large[0].depth() <= small[0].depth());
    }
    assert_reading_order(&doc, 3);
}

#[test]
fn test_body_only_document() {
    let pdf = PdfBuilder::new().page(body(100.0, 10)).build();
    let doc = outline_bytes(&pdf).unwrap();
    assert_eq!(doc, Document::empty());
}

#[test]
fn test_lines_are_extracted_in_reading_order() {
    let pipeline = Pipeline::with_rules();
    let extracted = pipeline
        .extract_bytes(&report_with_footers().build())
        .unwrap();

    assert_eq!(extracted.page_count(), 5);
    let first = &extracted.lines[0];
    assert_eq!(first.text, "Chapter 1");
    assert_eq!(first.page, 1);
    assert!(first.is_bold);
    assert!((first.font_size - 20.0).abs() < 0.01);
    assert!((first.position.y - 80.0).abs() < 0.5);
    assert!(extracted.lines.windows(2).all(|w| w[0].page <= w[1].page));
}
