//! PDF text extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use tracing::debug;

use super::images::{extract_page_images, ExtractedImage};
use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF content extractor.
///
/// lopdf parses (and, for empty-password files, decrypts) the document;
/// pdf-extract lays out the text of each page.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create an extractor with no document loaded.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Create an extractor and load `data` into it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    /// The parsed document.
    pub fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads raw bytes, so hand it the decrypted copy
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_pages(&self) -> Result<Vec<String>> {
        self.document()?;

        // pdf-extract panics on some malformed font programs
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
        }));

        match outcome {
            Ok(Ok(pages)) => {
                debug!("Extracted text from {} pages", pages.len());
                Ok(pages)
            }
            Ok(Err(e)) => Err(PdfError::TextExtraction(e.to_string())),
            Err(_) => Err(PdfError::TextExtraction(
                "text layout engine panicked".to_string(),
            )),
        }
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let index = page.checked_sub(1).ok_or(PdfError::InvalidPage(page))? as usize;
        self.extract_pages()?
            .into_iter()
            .nth(index)
            .ok_or(PdfError::InvalidPage(page))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<ExtractedImage>> {
        extract_page_images(self.document()?, page)
    }
}
