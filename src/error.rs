//! Error types for pdf-outline.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pdf-outline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while inferring or scoring outlines.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version header is malformed.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content from a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// The classifier artifact is missing fields or has the wrong shape.
    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),

    /// The configuration file could not be applied.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

/// Coarse classification of why a document could not be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Not a PDF, or a PDF whose object structure cannot be read.
    Unreadable,
    /// Encrypted document.
    Encrypted,
    /// File system error.
    Io,
    /// Text could not be extracted from the page content.
    Extraction,
    /// The pipeline panicked on this document.
    Panicked,
}

impl FailureKind {
    /// Classify an error.
    pub fn of(err: &Error) -> Self {
        match err {
            Error::Io(_) => FailureKind::Io,
            Error::Encrypted => FailureKind::Encrypted,
            Error::UnknownFormat | Error::UnsupportedVersion(_) | Error::PdfParse(_) => {
                FailureKind::Unreadable
            }
            _ => FailureKind::Extraction,
        }
    }

    /// Short lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Unreadable => "unreadable",
            FailureKind::Encrypted => "encrypted",
            FailureKind::Io => "io",
            FailureKind::Extraction => "extraction",
            FailureKind::Panicked => "panicked",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured description of a document that failed to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    /// The input file
    pub path: PathBuf,
    /// What went wrong
    pub kind: FailureKind,
    /// Human-readable detail
    pub message: String,
}

impl DocumentFailure {
    /// Build a failure descriptor from an error.
    pub fn from_error(path: &Path, err: &Error) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: FailureKind::of(err),
            message: err.to_string(),
        }
    }

    /// Build a failure descriptor for a panic payload.
    pub fn panicked(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: FailureKind::Panicked,
            message: message.into(),
        }
    }
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path.display(), self.kind, self.message)
    }
}

impl std::error::Error for DocumentFailure {}
