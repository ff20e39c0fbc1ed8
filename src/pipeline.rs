//! End-to-end outline inference for a single document.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use crate::assemble::OutlineAssembler;
use crate::classify::{load_model, ClassifiedLine, HeadingClassifier, HeadingModel, RuleModel};
use crate::config::OutlineConfig;
use crate::error::{DocumentFailure, Result};
use crate::filter::BoilerplateFilter;
use crate::layout::extract_lines;
use crate::model::{Document, ExtractedDocument};
use crate::parser::{ExtractOptions, PdfParser};

/// Intermediate results of a pipeline run, for diagnostics.
#[derive(Debug)]
pub struct Analysis<'a> {
    /// Lines dropped as running headers or footers
    pub removed: usize,
    /// Surviving lines with their features and labels, in reading order
    pub classified: Vec<ClassifiedLine<'a>>,
}

/// Extractor → boilerplate filter → classifier → assembler.
///
/// A pipeline holds no per-document state; the model is shared read-only,
/// so one pipeline can serve many worker threads.
#[derive(Clone)]
pub struct Pipeline {
    config: OutlineConfig,
    options: ExtractOptions,
    model: Arc<dyn HeadingModel>,
}

impl Pipeline {
    /// Create a pipeline around a loaded model with default thresholds.
    pub fn new(model: Arc<dyn HeadingModel>) -> Self {
        Self {
            config: OutlineConfig::default(),
            options: ExtractOptions::default(),
            model,
        }
    }

    /// Create a pipeline using only the font-size rules.
    pub fn with_rules() -> Self {
        Self::new(Arc::new(RuleModel::default()))
    }

    /// Create a pipeline from an optional model artifact path, falling back
    /// to the rules when it cannot be loaded.
    pub fn from_model_path(path: Option<&Path>, config: OutlineConfig) -> Self {
        let model = load_model(path, config.rules.clone());
        Self::new(model).with_config(config)
    }

    /// Set thresholds.
    pub fn with_config(mut self, config: OutlineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set extraction options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn model(&self) -> &dyn HeadingModel {
        self.model.as_ref()
    }

    /// Read the lines of a PDF file.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<ExtractedDocument> {
        let parser = PdfParser::open_with_options(path, self.options.clone())?;
        Ok(extract_lines(&parser.read_pages()?, self.options.parallel))
    }

    /// Read the lines of an in-memory PDF.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<ExtractedDocument> {
        let parser = PdfParser::from_bytes_with_options(data, self.options.clone())?;
        Ok(extract_lines(&parser.read_pages()?, self.options.parallel))
    }

    /// Filter and classify the lines of a document.
    pub fn analyze<'a>(&self, doc: &'a ExtractedDocument) -> Analysis<'a> {
        let filter = BoilerplateFilter::new(self.config.boilerplate.clone());
        let kept = filter.retain(doc);
        let removed = doc.lines.len() - kept.len();

        let classifier = HeadingClassifier::new(Arc::clone(&self.model), &self.config);
        Analysis {
            removed,
            classified: classifier.classify(&kept, doc),
        }
    }

    /// Infer the outline of already extracted lines.
    pub fn process_extracted(&self, doc: &ExtractedDocument) -> Document {
        if doc.is_empty() {
            return Document::empty();
        }
        let analysis = self.analyze(doc);
        let outline = OutlineAssembler::new(self.config.gate.clone()).assemble(&analysis.classified);
        log::info!(
            "{} pages, {} lines ({} boilerplate), {} headings, title {:?}",
            doc.page_count(),
            doc.lines.len(),
            analysis.removed,
            outline.outline.len(),
            outline.title
        );
        outline
    }

    /// Infer the outline of an in-memory PDF.
    pub fn process_bytes(&self, data: &[u8]) -> Result<Document> {
        let doc = self.extract_bytes(data)?;
        Ok(self.process_extracted(&doc))
    }

    /// Infer the outline of a PDF file.
    ///
    /// Every failure, including a panic inside the pipeline, is returned
    /// as a [`DocumentFailure`] naming the file.
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> std::result::Result<Document, DocumentFailure> {
        let path = path.as_ref();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.extract_file(path).map(|doc| self.process_extracted(&doc))
        }));

        match outcome {
            Ok(Ok(document)) => Ok(document),
            Ok(Err(e)) => Err(DocumentFailure::from_error(path, &e)),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(DocumentFailure::panicked(path, message))
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_rules()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("model", &self.model.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::model::{HeadingLabel, Line, PageInfo, Position};

    fn line(text: &str, page: u32, size: f32, bold: bool, y: f32) -> Line {
        Line::new(text, page, size, bold, Position::new(72.0, y), "Helvetica")
    }

    fn report() -> ExtractedDocument {
        let mut lines = vec![line("Annual Report 2024", 1, 28.0, true, 60.0)];
        for page in 1..=5 {
            lines.push(line(&format!("Part {}", page), page, 18.0, true, 110.0));
            for i in 0..4 {
                lines.push(line(
                    "Body text that fills the page with ordinary prose.",
                    page,
                    11.0,
                    false,
                    150.0 + i as f32 * 14.0,
                ));
            }
            lines.push(line(&format!("Page {} of 5", page), page, 9.0, false, 760.0));
        }
        ExtractedDocument::new((1..=5).map(PageInfo::letter).collect(), lines)
    }

    #[test]
    fn test_process_extracted() {
        let doc = Pipeline::with_rules().process_extracted(&report());
        assert_eq!(doc.title, "Annual Report 2024");
        assert_eq!(doc.outline.len(), 5);
        assert!(doc.outline.iter().all(|e| e.level == HeadingLabel::H1));
        assert!(doc.outline.iter().all(|e| !e.text.starts_with("Page")));
    }

    #[test]
    fn test_deterministic_json() {
        let pipeline = Pipeline::with_rules();
        let a = serde_json::to_string(&pipeline.process_extracted(&report())).unwrap();
        let b = serde_json::to_string(&pipeline.process_extracted(&report())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_document() {
        let doc = Pipeline::default().process_extracted(&ExtractedDocument::default());
        assert_eq!(doc, Document::empty());
    }

    #[test]
    fn test_analysis_counts_boilerplate() {
        let extracted = report();
        let analysis = Pipeline::default().analyze(&extracted);
        assert_eq!(analysis.removed, 5);
        assert_eq!(analysis.classified.len(), extracted.lines.len() - 5);
    }

    #[test]
    fn test_unreadable_file_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"just some text").unwrap();

        let failure = Pipeline::default().process_file(&path).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unreadable);
        assert_eq!(failure.path, path);
    }
}
