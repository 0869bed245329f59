//! Error types for the pdfx-core library.

use thiserror::Error;

/// Main error type for the pdfx library.
#[derive(Error, Debug)]
pub enum PdfxError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Rule set could not be loaded.
    #[error("rule error: {0}")]
    Rules(#[from] RuleError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Fatal errors raised while loading a rule set.
///
/// Both variants stop a run before any document is processed.
#[derive(Error, Debug)]
pub enum RuleError {
    /// The rule definitions are malformed (bad shape, empty or duplicate names).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A rule's pattern does not compile.
    #[error("invalid pattern for field '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

impl RuleError {
    /// Name of the offending field, when the error concerns a single rule.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::InvalidPattern { name, .. } => Some(name),
            Self::InvalidConfiguration(_) => None,
        }
    }
}

/// Result type for the pdfx library.
pub type Result<T> = std::result::Result<T, PdfxError>;
