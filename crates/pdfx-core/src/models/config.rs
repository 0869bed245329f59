//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RuleError;
use crate::rules::RuleSet;

/// Main configuration for a pdfx run.
///
/// `fields` is mandatory; every other section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PdfxConfig {
    /// Field rules in output column order.
    pub fields: Vec<FieldSpec>,

    /// PDF text extraction configuration.
    #[serde(default)]
    pub pdf: PdfConfig,

    /// Batch processing configuration.
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Default for PdfxConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldSpec::new("Invoice No", r"INV-\d+", true),
                FieldSpec::new("Web Address", r"https?://[^\s/$.?#].[^\s]*", false),
                FieldSpec::new("Email", r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}", false),
            ],
            pdf: PdfConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// One field definition as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Column header and lookup key.
    pub name: String,

    /// Regular expression; the whole match becomes the field value.
    pub pattern: String,

    /// Documents missing this field are rejected.
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            required,
        }
    }
}

/// PDF text extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfConfig {
    /// Prefix every page of saved text files with a `--- <name> - Page <n> ---`
    /// marker line. Rules always see the unmarked text.
    pub page_markers: bool,

    /// Documents with less trimmed text than this are treated as failed
    /// extractions (typically scanned, image-only PDFs).
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_markers: true,
            min_text_length: 0,
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Number of parallel workers (1 = sequential).
    pub jobs: usize,

    /// Descend into subdirectories when the input is a directory.
    pub recursive: bool,

    /// Header of the leading source column in tabular output (`null` omits it).
    pub source_column: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            recursive: true,
            source_column: Some("source".to_string()),
        }
    }
}

impl PdfxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Parse configuration from a JSON string.
    ///
    /// Shape errors (missing `fields`, wrong value types, unknown keys) are
    /// reported as [`RuleError::InvalidConfiguration`].
    pub fn from_json(content: &str) -> Result<Self, RuleError> {
        serde_json::from_str(content).map_err(|e| RuleError::InvalidConfiguration(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the validated rule set for this configuration.
    pub fn rule_set(&self) -> Result<RuleSet, RuleError> {
        RuleSet::from_specs(&self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_required_defaults_to_false() {
        let config = PdfxConfig::from_json(r#"{"fields": [{"name": "A", "pattern": "a"}]}"#).unwrap();
        assert_eq!(config.fields, vec![FieldSpec::new("A", "a", false)]);
        assert_eq!(config.pdf, PdfConfig::default());
        assert_eq!(config.batch, BatchConfig::default());
    }

    #[test]
    fn test_missing_fields_is_invalid() {
        let err = PdfxConfig::from_json(r#"{"pdf": {"page_markers": false}}"#).unwrap_err();
        assert!(matches!(err, RuleError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_wrong_value_types_are_invalid() {
        for json in [
            r#"{"fields": [{"name": 1, "pattern": "a"}]}"#,
            r#"{"fields": [{"name": "A", "pattern": ["a"]}]}"#,
            r#"{"fields": [{"name": "A", "pattern": "a", "required": "yes"}]}"#,
            r#"{"fields": {"name": "A", "pattern": "a"}}"#,
            r#"{"fields": [{"name": "A"}]}"#,
        ] {
            let err = PdfxConfig::from_json(json).unwrap_err();
            assert!(matches!(err, RuleError::InvalidConfiguration(_)), "accepted {json}");
        }
    }

    #[test]
    fn test_unknown_keys_are_invalid() {
        let err = PdfxConfig::from_json(
            r#"{"fields": [{"name": "A", "pattern": "a", "optional": true}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_source_column_can_be_disabled() {
        let config =
            PdfxConfig::from_json(r#"{"fields": [], "batch": {"source_column": null, "jobs": 4}}"#)
                .unwrap();
        assert_eq!(config.batch.source_column, None);
        assert_eq!(config.batch.jobs, 4);
        assert!(config.batch.recursive);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = PdfxConfig::default();
        config.save(&path).unwrap();

        let loaded = PdfxConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.rule_set().unwrap().len(), 3);
    }
}
