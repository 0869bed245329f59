//! PDF discovery and the lazy document text source.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{ExtractedImage, PdfExtractor, PdfProcessor};
use crate::error::PdfError;
use crate::models::config::PdfConfig;
use crate::models::document::DocumentText;

/// Whether `path` has a `.pdf` extension (any case).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// File name without extension, used in page markers and output names.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Collect the PDFs to process under `root`.
///
/// A file is returned as-is. A directory is walked in file-name order,
/// descending into subdirectories when `recursive` is set; unreadable
/// entries are skipped with a warning.
pub fn discover_pdfs(root: &Path, recursive: bool) -> crate::Result<Vec<PathBuf>> {
    if fs::metadata(root)?.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let walker = WalkDir::new(root).sort_by_file_name();
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_pdf(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry under {}: {}", root.display(), e),
        }
    }

    debug!("Found {} PDF files under {}", files.len(), root.display());
    Ok(files)
}

/// Join page texts, optionally prefixing each page with a marker line.
pub fn render_pages(stem: &str, pages: &[String], page_markers: bool) -> String {
    if !page_markers {
        return pages.join("\n\n");
    }

    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        text.push_str(&format!("--- {} - Page {} ---\n", stem, index + 1));
        text.push_str(page);
        text.push_str("\n\n");
    }
    text
}

/// A PDF file opened for extraction.
pub struct PdfDocument {
    path: PathBuf,
    extractor: PdfExtractor,
}

impl PdfDocument {
    /// Read and parse the PDF at `path`.
    pub fn open(path: &Path) -> crate::Result<Self> {
        let data = fs::read(path)?;
        let extractor = PdfExtractor::from_bytes(&data)?;
        Ok(Self {
            path: path.to_path_buf(),
            extractor,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier used for this document in batch results.
    pub fn source_id(&self) -> String {
        self.path.display().to_string()
    }

    pub fn stem(&self) -> String {
        document_stem(&self.path)
    }

    pub fn page_count(&self) -> u32 {
        self.extractor.page_count()
    }

    /// Text of every page, in page order.
    ///
    /// Fails when the pages hold fewer than `min_text_length` characters.
    pub fn pages(&self, config: &PdfConfig) -> crate::Result<Vec<String>> {
        let pages = self.extractor.extract_pages()?;

        let content_len: usize = pages.iter().map(|p| p.trim().chars().count()).sum();
        if content_len < config.min_text_length {
            return Err(PdfError::TextExtraction(format!(
                "no extractable text ({} characters, minimum {})",
                content_len, config.min_text_length
            ))
            .into());
        }

        Ok(pages)
    }

    /// Text written to disk, with page markers when `config.page_markers` is set.
    pub fn saved_text(&self, pages: &[String], config: &PdfConfig) -> String {
        render_pages(&self.stem(), pages, config.page_markers)
    }

    /// Embedded images of every page.
    pub fn images(&self) -> crate::Result<Vec<ExtractedImage>> {
        let mut images = Vec::new();
        for page in 1..=self.page_count() {
            images.extend(self.extractor.extract_images(page)?);
        }
        Ok(images)
    }
}

/// Extract one document's text, turning any failure into an error marker.
///
/// The text is the pages joined by blank lines, without page markers.
pub fn load_document(path: &Path, config: &PdfConfig) -> DocumentText {
    load_document_with(path, config, |_, _| {})
}

/// Like [`load_document`], handing the opened document and its pages to
/// `exports` before the text is built.
///
/// `exports` is not called when the file cannot be opened. It receives
/// `None` for the pages when text extraction failed.
pub fn load_document_with<F>(path: &Path, config: &PdfConfig, exports: F) -> DocumentText
where
    F: FnOnce(&PdfDocument, Option<&[String]>),
{
    let source_id = path.display().to_string();

    let document = match PdfDocument::open(path) {
        Ok(document) => document,
        Err(e) => return DocumentText::failed(source_id, e),
    };

    match document.pages(config) {
        Ok(pages) => {
            exports(&document, Some(&pages));
            DocumentText::extracted(source_id, pages.join("\n\n"))
        }
        Err(e) => {
            exports(&document, None);
            DocumentText::failed(source_id, e)
        }
    }
}

/// Lazy sequence of document texts for a list of PDF paths.
///
/// Each PDF is read and extracted only when the next element is requested.
pub struct PdfTextSource {
    paths: std::vec::IntoIter<PathBuf>,
    config: PdfConfig,
}

impl PdfTextSource {
    pub fn new(paths: Vec<PathBuf>, config: PdfConfig) -> Self {
        Self {
            paths: paths.into_iter(),
            config,
        }
    }

    /// Source over every PDF found under `root`.
    pub fn discover(root: &Path, recursive: bool, config: PdfConfig) -> crate::Result<Self> {
        Ok(Self::new(discover_pdfs(root, recursive)?, config))
    }
}

impl Iterator for PdfTextSource {
    type Item = DocumentText;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        debug!("Extracting text from {}", path.display());
        Some(load_document(&path, &self.config))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

impl ExactSizeIterator for PdfTextSource {}
