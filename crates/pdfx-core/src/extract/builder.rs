//! Record builder: applies a rule set to one document's text.

use tracing::{debug, trace};

use crate::models::record::{ExtractionResult, ExtractionStatus, FieldValues, RejectionReason};
use crate::rules::RuleSet;

/// Builds extraction records against a borrowed rule set.
///
/// Building is two-phase: every field is matched first, then the complete
/// value mapping is validated against the required fields. Both phases are
/// pure, so building the same text twice yields identical results.
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder<'r> {
    rules: &'r RuleSet,
}

impl<'r> RecordBuilder<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'r RuleSet {
        self.rules
    }

    /// Match and validate one document.
    pub fn build(&self, source_id: impl Into<String>, text: &str) -> ExtractionResult {
        let source_id = source_id.into();
        let values = self.match_fields(text);
        let status = self.validate(&values);

        debug!(
            "{}: matched {}/{} fields -> {:?}",
            source_id,
            values.matched_count(),
            values.len(),
            status
        );

        ExtractionResult {
            source_id,
            values,
            status,
        }
    }

    /// Match every rule against `text`, in declaration order.
    pub fn match_fields(&self, text: &str) -> FieldValues {
        let mut values = FieldValues::with_capacity(self.rules.len());
        for rule in self.rules {
            let found = rule.find(text);
            trace!("field '{}': {:?}", rule.name(), found);
            values.push(rule.name(), found.map(str::to_string));
        }
        values
    }

    /// Decide accept/reject from an already-built value mapping.
    ///
    /// The first required field (in declaration order) without a value is
    /// the reported reason, regardless of how many are missing.
    pub fn validate(&self, values: &FieldValues) -> ExtractionStatus {
        match self.rules.required_names().find(|name| !values.is_present(name)) {
            Some(name) => {
                ExtractionStatus::Rejected(RejectionReason::MissingRequiredField(name.to_string()))
            }
            None => ExtractionStatus::Accepted,
        }
    }

    /// Record for a document whose text could not be obtained.
    ///
    /// The builder is not run; every field is recorded as absent.
    pub fn extraction_failed(
        &self,
        source_id: impl Into<String>,
        message: impl Into<String>,
    ) -> ExtractionResult {
        let mut values = FieldValues::with_capacity(self.rules.len());
        for rule in self.rules {
            values.push(rule.name(), None);
        }
        ExtractionResult {
            source_id: source_id.into(),
            values,
            status: ExtractionStatus::Rejected(RejectionReason::ExtractionFailed(message.into())),
        }
    }
}

/// Apply `rules` to one document's text.
pub fn build(source_id: impl Into<String>, text: &str, rules: &RuleSet) -> ExtractionResult {
    RecordBuilder::new(rules).build(source_id, text)
}
