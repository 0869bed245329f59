//! Field rules and the ordered rule set built from configuration.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::matcher::PatternMatcher;
use crate::error::RuleError;
use crate::models::config::FieldSpec;

/// One named extraction directive.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    matcher: PatternMatcher,
    required: bool,
}

impl FieldRule {
    /// Compile a rule from its configuration entry.
    pub fn new(spec: &FieldSpec) -> Result<Self, RuleError> {
        Ok(Self {
            name: spec.name.clone(),
            matcher: PatternMatcher::compile(&spec.name, &spec.pattern)?,
            required: spec.required,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// First match of this rule's pattern in `text`.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.matcher.find_first(text)
    }

    /// Configuration entry equivalent to this rule.
    pub fn to_spec(&self) -> FieldSpec {
        FieldSpec::new(&self.name, self.pattern(), self.required)
    }
}

/// Ordered, validated collection of field rules.
///
/// Declaration order is output column order. A rule set is immutable once
/// built and can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// Build a rule set from configuration entries.
    ///
    /// Names are checked before any pattern is compiled, so a set with both
    /// a duplicate name and a broken pattern reports the name problem.
    pub fn from_specs(specs: &[FieldSpec]) -> Result<Self, RuleError> {
        let mut seen = HashSet::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(RuleError::InvalidConfiguration(format!(
                    "field #{} has an empty name",
                    index + 1
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(RuleError::InvalidConfiguration(format!(
                    "duplicate field name '{}'",
                    spec.name
                )));
            }
        }

        let rules = specs
            .iter()
            .map(FieldRule::new)
            .collect::<Result<Vec<_>, _>>()?;

        if rules.is_empty() {
            warn!("Rule set has no fields; every document will be accepted with no values");
        }
        debug!(
            "Loaded rule set with {} fields ({} required)",
            rules.len(),
            rules.iter().filter(|r| r.required).count()
        );

        Ok(Self { rules })
    }

    /// Iterate rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter()
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Names of required fields, in declaration order.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|r| r.required)
            .map(|r| r.name.as_str())
    }

    /// Output column headers, in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Configuration entries for persisting this rule set.
    pub fn to_specs(&self) -> Vec<FieldSpec> {
        self.rules.iter().map(FieldRule::to_spec).collect()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a FieldRule;
    type IntoIter = std::slice::Iter<'a, FieldRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
