//! The bundled classifier artifact drives the pipeline.

mod common;

use std::path::PathBuf;

use common::report_with_footers;
use pdf_outline::{HeadingLabel, HeadingModel, LinearModel, OutlineConfig, Pipeline};

fn artifact() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/heading_classifier.json")
}

#[test]
fn test_bundled_artifact_loads() {
    let model = LinearModel::from_file(artifact()).unwrap();
    assert_eq!(model.name(), "heading-lr-v1");
}

#[test]
fn test_pipeline_with_bundled_artifact() {
    let pipeline = Pipeline::from_model_path(Some(&artifact()), OutlineConfig::default());
    assert_eq!(pipeline.model().name(), "heading-lr-v1");

    let doc = pipeline.process_bytes(&report_with_footers().build()).unwrap();
    assert_eq!(doc.outline.len(), 5);
    assert!(doc.outline.iter().all(|e| e.level == HeadingLabel::H1));
    assert!(doc.outline.iter().all(|e| e.text.starts_with("Chapter")));
}
