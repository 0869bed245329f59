//! PDF processing module.

mod extractor;
mod images;
mod source;

#[cfg(test)]
pub(crate) mod test_support;

pub use extractor::PdfExtractor;
pub use images::{extract_page_images, ExtractedImage};
pub use source::{
    discover_pdfs, document_stem, is_pdf, load_document, load_document_with, render_pages,
    PdfDocument, PdfTextSource,
};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text of every page, in page order.
    fn extract_pages(&self) -> Result<Vec<String>>;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String> {
        Ok(self.extract_pages()?.join("\n\n"))
    }

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Extract embedded images from a page (1-indexed).
    fn extract_images(&self, page: u32) -> Result<Vec<ExtractedImage>>;
}
