//! Directory batch processing.
//!
//! Every PDF in the input directory gets a `<stem>.json` in the output
//! directory. Documents are independent: a failure degrades that one file
//! to an empty outline and is recorded in the [`BatchReport`].

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::detect::has_pdf_extension;
use crate::error::{DocumentFailure, Result};
use crate::model::Document;
use crate::pipeline::Pipeline;
use crate::render::{write_json, JsonFormat};

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Documents whose outline was inferred
    pub processed: usize,
    /// Documents that failed and were written as empty outlines
    pub failed: usize,
    /// Details of each failure, in input order
    pub failures: Vec<DocumentFailure>,
    /// JSON files written, in input order
    pub outputs: Vec<PathBuf>,
}

impl BatchReport {
    /// Total number of input documents.
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }

    /// Check if every document succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// PDF files directly inside a directory, sorted by path.
pub fn scan_pdfs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_pdf_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Output path for an input PDF.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    output_dir.join(format!("{}.json", stem))
}

/// Runs a pipeline over a directory of PDFs.
pub struct BatchRunner<'p> {
    pipeline: &'p Pipeline,
    format: JsonFormat,
    parallel: bool,
}

impl<'p> BatchRunner<'p> {
    /// Create a runner writing pretty JSON in parallel.
    pub fn new(pipeline: &'p Pipeline) -> Self {
        Self {
            pipeline,
            format: JsonFormat::Pretty,
            parallel: true,
        }
    }

    /// Set the JSON format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable processing documents in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Process every PDF in `input_dir`.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        self.run_with_progress(input_dir, output_dir, |_| {})
    }

    /// Process every PDF in `input_dir`, calling `on_done` after each file.
    pub fn run_with_progress<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        on_done: F,
    ) -> Result<BatchReport>
    where
        F: Fn(&Path) + Sync,
    {
        let inputs = scan_pdfs(input_dir)?;
        fs::create_dir_all(output_dir)?;
        log::info!("Found {} PDF files in {}", inputs.len(), input_dir.display());

        let process = |input: &PathBuf| {
            let outcome = self.process_one(input, output_dir);
            on_done(input);
            outcome
        };
        let outcomes: Vec<(PathBuf, Option<DocumentFailure>)> = if self.parallel {
            inputs.par_iter().map(process).collect()
        } else {
            inputs.iter().map(process).collect()
        };

        let mut report = BatchReport::default();
        for (output, failure) in outcomes {
            match failure {
                Some(failure) => {
                    report.failed += 1;
                    report.failures.push(failure);
                }
                None => report.processed += 1,
            }
            report.outputs.push(output);
        }
        log::info!(
            "Batch finished: {} processed, {} failed",
            report.processed,
            report.failed
        );
        Ok(report)
    }

    fn process_one(&self, input: &Path, output_dir: &Path) -> (PathBuf, Option<DocumentFailure>) {
        let output = output_path(input, output_dir);
        let (document, mut failure) = match self.pipeline.process_file(input) {
            Ok(document) => (document, None),
            Err(failure) => {
                log::warn!("{}", failure);
                (Document::empty(), Some(failure))
            }
        };

        if let Err(e) = write_json(&document, &output, self.format) {
            log::warn!("Failed to write {}: {}", output.display(), e);
            if failure.is_none() {
                failure = Some(DocumentFailure::from_error(input, &e));
            }
        }
        (output, failure)
    }
}
