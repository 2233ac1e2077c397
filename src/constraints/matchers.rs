use crate::errors::{AutomationError, Result};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Comparison semantics for one attribute value. The matcher decides how a
/// candidate value is compared; the constraint only decides which attribute
/// is read.
#[derive(Clone)]
pub enum ValueMatcher {
    Exact(String),
    CaseInsensitive(String),
    Pattern(Regex),
    /// Compared by parsed-URL equality so trailing slashes and
    /// percent-encoding differences do not produce false negatives.
    Url(url::Url),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ValueMatcher {
    pub fn exact(value: impl Into<String>) -> Self {
        ValueMatcher::Exact(value.into())
    }

    pub fn case_insensitive(value: impl Into<String>) -> Self {
        ValueMatcher::CaseInsensitive(value.into())
    }

    pub fn pattern(pattern: Regex) -> Self {
        ValueMatcher::Pattern(pattern)
    }

    /// Compile `pattern` as a regular expression matcher.
    pub fn pattern_str(pattern: &str) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|e| {
            AutomationError::InvalidConstraint(format!("bad pattern '{}': {}", pattern, e))
        })?;
        Ok(ValueMatcher::Pattern(compiled))
    }

    pub fn url(value: &str) -> Result<Self> {
        let parsed = url::Url::parse(value).map_err(|e| {
            AutomationError::InvalidConstraint(format!("bad url '{}': {}", value, e))
        })?;
        Ok(ValueMatcher::Url(parsed))
    }

    pub fn predicate(test: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        ValueMatcher::Predicate(Arc::new(test))
    }

    /// Apply the matcher to a present attribute value. Absent values are
    /// handled by the constraint layer and never reach a matcher.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValueMatcher::Exact(expected) => expected == value,
            ValueMatcher::CaseInsensitive(expected) => {
                expected.to_lowercase() == value.to_lowercase()
            }
            ValueMatcher::Pattern(pattern) => pattern.is_match(value),
            ValueMatcher::Url(expected) => url::Url::parse(value)
                .map(|candidate| candidate == *expected)
                .unwrap_or(false),
            ValueMatcher::Predicate(test) => test(value),
        }
    }
}

impl fmt::Display for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMatcher::Exact(expected) => write!(f, "= '{}'", expected),
            ValueMatcher::CaseInsensitive(expected) => {
                write!(f, "= '{}' (ignoring case)", expected)
            }
            ValueMatcher::Pattern(pattern) => write!(f, "matches /{}/", pattern.as_str()),
            ValueMatcher::Url(expected) => write!(f, "= url '{}'", expected),
            ValueMatcher::Predicate(_) => write!(f, "satisfies predicate"),
        }
    }
}

impl fmt::Debug for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueMatcher({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_is_case_sensitive() {
        let matcher = ValueMatcher::exact("Login");
        assert!(matcher.matches("Login"));
        assert!(!matcher.matches("login"));
    }

    #[test]
    fn case_insensitive_ignores_case() {
        let matcher = ValueMatcher::case_insensitive("LOGIN");
        assert!(matcher.matches("login"));
        assert!(matcher.matches("Login"));
        assert!(!matcher.matches("logout"));
    }

    #[test]
    fn pattern_matches_substring() {
        let matcher = ValueMatcher::pattern_str("^btn-[0-9]+$").unwrap();
        assert!(matcher.matches("btn-42"));
        assert!(!matcher.matches("btn-"));
    }

    #[test]
    fn bad_pattern_is_invalid_constraint() {
        let err = ValueMatcher::pattern_str("(").unwrap_err();
        assert!(matches!(err, AutomationError::InvalidConstraint(_)));
    }

    #[test]
    fn url_equality_survives_normalization() {
        let matcher = ValueMatcher::url("http://example.com").unwrap();
        // the parser normalizes the missing trailing slash on both sides
        assert!(matcher.matches("http://example.com/"));
        assert!(!matcher.matches("http://example.com/login"));
        assert!(!matcher.matches("not a url"));
    }

    #[test]
    fn predicate_delegates() {
        let matcher = ValueMatcher::predicate(|v| v.len() > 3);
        assert!(matcher.matches("abcd"));
        assert!(!matcher.matches("ab"));
    }
}
