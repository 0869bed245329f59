//! Data models shared across the pipeline.

pub mod config;
pub mod document;
pub mod record;

pub use config::{BatchConfig, FieldSpec, PdfConfig, PdfxConfig};
pub use document::DocumentText;
pub use record::{ExtractionResult, ExtractionStatus, FieldValue, FieldValues, RejectionReason};
