//! PDF document reader.

use std::path::Path;

use crate::detect::{sniff_bytes, sniff_path};
use crate::error::{Error, Result};
use crate::model::PageInfo;

use super::backend::{LopdfBackend, PdfBackend};
use super::content::{ContentInterpreter, PageContent};
use super::options::{ErrorMode, ExtractOptions, PageSelection};

/// Reads positioned text runs from every selected page of a PDF.
pub struct PdfParser<B: PdfBackend = LopdfBackend> {
    backend: B,
    options: ExtractOptions,
}

impl PdfParser<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ExtractOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Self> {
        let path = path.as_ref();
        let header = sniff_path(path)?;
        log::debug!("{}: PDF {}", path.display(), header.version);

        let backend = LopdfBackend::load_file(path)?;
        Ok(Self::with_backend(backend, options))
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ExtractOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ExtractOptions) -> Result<Self> {
        sniff_bytes(data)?;
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self::with_backend(backend, options))
    }
}

impl<B: PdfBackend> PdfParser<B> {
    /// Wrap an already loaded backend.
    pub fn with_backend(backend: B, options: ExtractOptions) -> Self {
        Self { backend, options }
    }

    /// Extraction options in effect.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Read the text runs of all selected pages, in page order.
    ///
    /// In lenient mode a page that cannot be interpreted contributes no
    /// runs; in strict mode it fails the whole document.
    pub fn read_pages(&self) -> Result<Vec<PageContent>> {
        let pages = self.backend.pages();
        let total = pages.len() as u32;

        if let PageSelection::Pages(selected) = &self.options.pages {
            if let Some(&missing) = selected.iter().find(|&&p| p > total) {
                if self.options.error_mode == ErrorMode::Strict {
                    return Err(Error::PageOutOfRange(missing, total));
                }
                log::warn!("Page {} out of range (document has {})", missing, total);
            }
        }

        let mut contents = Vec::with_capacity(pages.len());
        for (&number, &page_id) in pages.iter() {
            if !self.options.pages.includes(number) {
                continue;
            }

            let interpreter = match ContentInterpreter::new(&self.backend, page_id) {
                Ok(interpreter) => interpreter,
                Err(e) => {
                    if self.options.error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Failed to read fonts of page {}: {}", number, e);
                    let media_box = self.backend.media_box(page_id);
                    contents.push(PageContent::blank(PageInfo::new(
                        number,
                        media_box.width(),
                        media_box.height(),
                    )));
                    continue;
                }
            };

            let info = interpreter.page_info(number);
            match interpreter.run() {
                Ok(runs) => contents.push(PageContent::new(info, runs)),
                Err(e) => {
                    if self.options.error_mode == ErrorMode::Strict {
                        return Err(Error::TextExtract(format!("page {}: {}", number, e)));
                    }
                    log::warn!("Failed to extract text from page {}: {}", number, e);
                    contents.push(PageContent::blank(info));
                }
            }
        }

        Ok(contents)
    }
}
