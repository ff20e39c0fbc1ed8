//! PDF parsing module.

pub mod backend;
mod content;
mod options;
mod pdf_parser;

pub use backend::{LopdfBackend, PdfBackend};
pub use content::{is_bold_font, is_spaceless_script_char, ContentInterpreter, PageContent, TextRun};
pub use options::{ErrorMode, ExtractOptions, PageSelection};
pub use pdf_parser::PdfParser;
