//! Per-document extraction records.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// The value recorded for one field of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// Field name from the rule set.
    pub name: String,
    /// Matched text, or `None` when the pattern did not match.
    pub value: Option<String>,
}

/// Ordered field values of one document, in rule declaration order.
///
/// Serializes as a JSON object whose keys keep that order; absent values
/// become `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    entries: Vec<FieldValue>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a field value.
    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.entries.push(FieldValue {
            name: name.into(),
            value,
        });
    }

    /// Look up the entry for a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Matched text for a field; `None` if absent or unknown.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|e| e.value.as_deref())
    }

    /// Whether the field matched.
    pub fn is_present(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields that matched.
    pub fn matched_count(&self) -> usize {
        self.entries.iter().filter(|e| e.value.is_some()).count()
    }
}

impl Serialize for FieldValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}

/// Why a document produced no output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Text was obtained but this required field never matched.
    MissingRequiredField(String),
    /// No text could be obtained for the document.
    ExtractionFailed(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredField(name) => write!(f, "missing required field: {}", name),
            Self::ExtractionFailed(message) => write!(f, "extraction failed: {}", message),
        }
    }
}

/// Outcome of applying a rule set to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ExtractionStatus {
    Accepted,
    Rejected(RejectionReason),
}

/// Per-document extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Identifier of the originating document (opaque to the engine).
    pub source_id: String,
    /// Every field of the rule set, matched or absent.
    pub values: FieldValues,
    /// Accept/reject decision.
    #[serde(flatten)]
    pub status: ExtractionStatus,
}

impl ExtractionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, ExtractionStatus::Accepted)
    }

    /// The rejection reason, if the document was rejected.
    pub fn rejection(&self) -> Option<&RejectionReason> {
        match &self.status {
            ExtractionStatus::Accepted => None,
            ExtractionStatus::Rejected(reason) => Some(reason),
        }
    }
}
