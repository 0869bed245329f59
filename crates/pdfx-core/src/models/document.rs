//! Text handed over by a text source for one document.

/// One element of a document text sequence.
///
/// `text` carries the full extracted text, or the reason text extraction
/// failed for this document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    /// Path or display name of the document.
    pub source_id: String,
    /// Extracted text or extraction error message.
    pub text: Result<String, String>,
}

impl DocumentText {
    /// A document whose text was extracted.
    pub fn extracted(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: Ok(text.into()),
        }
    }

    /// A document whose text could not be obtained.
    pub fn failed(source_id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            source_id: source_id.into(),
            text: Err(error.to_string()),
        }
    }
}
