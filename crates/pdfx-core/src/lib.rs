//! Core library for rule-based field extraction from PDF documents.
//!
//! This crate provides:
//! - PDF processing (page text and embedded image extraction)
//! - Field rules: named regex patterns, optionally required
//! - Record building: one result per document, accepted or rejected
//! - Batch coordination over a lazy sequence of documents

pub mod batch;
pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod rules;

pub use batch::{BatchCoordinator, BatchResult, BatchSummary, CancellationToken};
pub use error::{PdfError, PdfxError, Result, RuleError};
pub use extract::RecordBuilder;
pub use models::{
    DocumentText, ExtractionResult, ExtractionStatus, FieldSpec, FieldValues, PdfxConfig,
    RejectionReason,
};
pub use pdf::{PdfDocument, PdfExtractor, PdfProcessor, PdfTextSource};
pub use rules::{FieldRule, PatternMatcher, RuleSet};
