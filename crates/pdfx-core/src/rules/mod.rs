//! Field rules: pattern compilation and the validated rule set.

mod matcher;
mod rule_set;

pub use matcher::PatternMatcher;
pub use rule_set::{FieldRule, RuleSet};
