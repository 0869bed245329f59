//! Single-pattern matcher.

use regex::Regex;

use crate::error::RuleError;

/// A compiled field pattern.
///
/// Patterns use the `regex` crate dialect verbatim: matching is
/// case-sensitive unless the pattern carries its own inline flags, nothing is
/// anchored implicitly, and `.` does not cross newlines without `(?s)`.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Compile `pattern` for the field called `field`.
    pub fn compile(field: &str, pattern: &str) -> Result<Self, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            name: field.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// The pattern source as configured.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Return the whole span of the leftmost match, if any.
    ///
    /// Capture groups never narrow the result; group 0 is always returned.
    pub fn find_first<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex.find(text).map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_returns_leftmost_match() {
        let matcher = PatternMatcher::compile("Invoice No", r"INV-\d+").unwrap();
        assert_eq!(matcher.find_first("INV-12 and INV-34"), Some("INV-12"));
        assert_eq!(matcher.find_first("xx INV-7"), Some("INV-7"));
    }

    #[test]
    fn test_capture_groups_do_not_narrow_match() {
        let matcher = PatternMatcher::compile("Total", r"Total: (\d+)").unwrap();
        assert_eq!(matcher.find_first("Total: 250 PLN"), Some("Total: 250"));
    }

    #[test]
    fn test_case_sensitive_by_default() {
        let matcher = PatternMatcher::compile("Code", "ABC").unwrap();
        assert_eq!(matcher.find_first("abc"), None);

        let insensitive = PatternMatcher::compile("Code", "(?i)ABC").unwrap();
        assert_eq!(insensitive.find_first("xabcx"), Some("abc"));
    }

    #[test]
    fn test_no_implicit_anchoring() {
        let matcher = PatternMatcher::compile("Year", r"\d{4}").unwrap();
        assert_eq!(matcher.find_first("issued in 2024."), Some("2024"));
    }

    #[test]
    fn test_empty_match_is_a_match() {
        let matcher = PatternMatcher::compile("Maybe", "x*").unwrap();
        assert_eq!(matcher.find_first("abc"), Some(""));
    }

    #[test]
    fn test_compile_failure_names_field() {
        let err = PatternMatcher::compile("Broken", "(unclosed").unwrap_err();
        assert_eq!(err.field_name(), Some("Broken"));
    }

    #[test]
    fn test_lookaround_is_rejected() {
        let err = PatternMatcher::compile("Amount", r"(?<=Total: )\d+").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }
}
