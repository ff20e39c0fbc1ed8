//! # pdf-outline
//!
//! Heading outline inference for untagged PDF documents.
//!
//! The library reads the text lines of a PDF, drops running headers and
//! footers, labels each line as H1, H2, H3 or body text from layout cues,
//! and assembles a title plus an ordered outline.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_outline::{outline_file, render};
//!
//! fn main() -> pdf_outline::Result<()> {
//!     let doc = outline_file("report.pdf")?;
//!
//!     let json = render::to_json(&doc, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layout-aware extraction**: multi-column pages, weighted font modes
//! - **Boilerplate removal**: running headers, footers and page numbers
//! - **Pluggable classifier**: JSON linear model with a font-size rule fallback
//! - **Consistent levels**: one level per relative font size within a document
//! - **Scoring**: precision, recall, F1 and hierarchy accuracy against references
//! - **Parallel processing**: Uses Rayon across documents and pages

pub mod assemble;
pub mod batch;
pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod eval;
pub mod filter;
pub mod layout;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod text;

// Re-export commonly used types
pub use assemble::OutlineAssembler;
pub use batch::{scan_pdfs, BatchReport, BatchRunner};
pub use classify::{
    load_model, FeatureVector, HeadingClassifier, HeadingModel, LevelPins, LinearModel,
    Prediction, RuleModel, DEFAULT_MODEL_PATH,
};
pub use config::{BoilerplateConfig, GateConfig, LevelConfig, OutlineConfig, RuleThresholds};
pub use detect::{has_pdf_extension, sniff_bytes, sniff_path, PdfHeader};
pub use error::{DocumentFailure, Error, FailureKind, Result};
pub use eval::{
    BatchEvaluation, EvaluationResult, Evaluator, FailedEvaluation, MatchPolicy, Scores,
};
pub use filter::BoilerplateFilter;
pub use model::{Document, ExtractedDocument, HeadingLabel, Line, OutlineEntry, PageInfo, Position};
pub use parser::{ErrorMode, ExtractOptions, PageSelection, PdfParser};
pub use pipeline::{Analysis, Pipeline};
pub use render::JsonFormat;

use std::path::Path;

/// Infer the outline of a PDF file using the font-size rules.
///
/// # Arguments
///
/// * `path` - Path to the PDF file
///
/// # Example
///
/// ```no_run
/// use pdf_outline::outline_file;
///
/// let doc = outline_file("report.pdf").unwrap();
/// println!("{}: {} headings", doc.title, doc.outline.len());
/// ```
pub fn outline_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let pipeline = Pipeline::with_rules();
    let doc = pipeline.extract_file(path)?;
    Ok(pipeline.process_extracted(&doc))
}

/// Infer the outline of a PDF file with a model artifact and thresholds.
///
/// A missing or invalid model falls back to the font-size rules.
///
/// # Arguments
///
/// * `path` - Path to the PDF file
/// * `model` - Path to a classifier artifact, if any
/// * `config` - Pipeline thresholds
///
/// # Example
///
/// ```no_run
/// use pdf_outline::{outline_file_with, OutlineConfig};
/// use std::path::Path;
///
/// let doc = outline_file_with(
///     "report.pdf",
///     Some(Path::new("models/heading_classifier.json")),
///     OutlineConfig::default(),
/// )
/// .unwrap();
/// ```
pub fn outline_file_with<P: AsRef<Path>>(
    path: P,
    model: Option<&Path>,
    config: OutlineConfig,
) -> Result<Document> {
    let pipeline = Pipeline::from_model_path(model, config);
    let doc = pipeline.extract_file(path)?;
    Ok(pipeline.process_extracted(&doc))
}

/// Infer the outline of an in-memory PDF using the font-size rules.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::outline_bytes;
///
/// let data = std::fs::read("report.pdf").unwrap();
/// let doc = outline_bytes(&data).unwrap();
/// ```
pub fn outline_bytes(data: &[u8]) -> Result<Document> {
    Pipeline::with_rules().process_bytes(data)
}

/// Score a produced outline JSON file against a reference with exact matching.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::evaluate_files;
///
/// let result = evaluate_files("output/report.json", "reference/report.json").unwrap();
/// println!("F1: {:.3}", result.f1());
/// ```
pub fn evaluate_files<P: AsRef<Path>, Q: AsRef<Path>>(
    produced: P,
    reference: Q,
) -> Result<EvaluationResult> {
    Evaluator::default().evaluate_files(produced.as_ref(), reference.as_ref())
}
