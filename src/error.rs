//! Error types for template compilation, matching, and URL building.
//!
//! This module provides the [`PatternError`] enum covering every failure the
//! crate can report, together with the [`PatternResult`] alias used
//! throughout the public API.

use thiserror::Error;

/// The primary error type for this crate.
///
/// Build-time errors (`MalformedTemplate`, `InvalidPattern`,
/// `CapturingGroup`, `DuplicateVariable`) are raised while a pattern is
/// being constructed and become sticky on the
/// [`Pattern`](crate::Pattern) that caused them. Reverse-build errors
/// (`MissingVariable`, `VariableMismatch`, `MissingTemplate`) are returned
/// directly from URL-building calls and never affect match behavior.
#[derive(Error, Debug, Clone)]
pub enum PatternError {
    /// A template's structure is invalid: unbalanced braces, an empty
    /// variable name or pattern, a path template without a leading slash,
    /// a query template without a `key=value` form, or an odd number of
    /// query key/value strings.
    #[error("malformed template: {0}")]
    MalformedTemplate(String),

    /// A regular expression assembled from the template failed to compile.
    #[error("invalid pattern in template {template:?}")]
    InvalidPattern {
        /// The template whose pattern was rejected.
        template: String,
        /// The underlying regex engine error.
        #[source]
        source: regex::Error,
    },

    /// A variable's custom pattern contains its own capturing group.
    ///
    /// Only non-capturing groups are accepted inside variable patterns,
    /// e.g. `(?:pattern)` instead of `(pattern)`.
    #[error("template {template:?} contains capturing groups in its pattern; use non-capturing groups instead, e.g. (?:pattern)")]
    CapturingGroup {
        /// The offending template.
        template: String,
    },

    /// The same variable name is declared in two different matchers
    /// attached to one pattern.
    #[error("duplicated route variable {0:?}")]
    DuplicateVariable(String),

    /// A value for a declared variable was not supplied to a reverse build.
    #[error("missing route variable {0:?}")]
    MissingVariable(String),

    /// A supplied value does not match the variable's declared pattern.
    #[error("variable value {value:?} doesn't match expected pattern {pattern:?}")]
    VariableMismatch {
        /// The rejected value.
        value: String,
        /// The fully-anchored pattern the value was expected to match.
        pattern: String,
    },

    /// A reverse build was requested for a URL component the pattern does
    /// not define (e.g. [`Pattern::url_host`](crate::Pattern::url_host) on
    /// a pattern with no host template).
    #[error("pattern has no {0} template")]
    MissingTemplate(&'static str),
}

/// A convenience type alias for `Result<T, PatternError>`.
pub type PatternResult<T> = Result<T, PatternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_template_display() {
        let err = PatternError::MalformedTemplate("unbalanced braces in \"{x\"".into());
        assert_eq!(
            err.to_string(),
            "malformed template: unbalanced braces in \"{x\""
        );
    }

    #[test]
    fn test_invalid_pattern_carries_source() {
        let source = regex::Regex::new("[").unwrap_err();
        let err = PatternError::InvalidPattern {
            template: "/{id:[}".into(),
            source,
        };
        assert!(err.to_string().contains("/{id:[}"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_duplicate_variable_display() {
        let err = PatternError::DuplicateVariable("id".into());
        assert_eq!(err.to_string(), "duplicated route variable \"id\"");
    }

    #[test]
    fn test_variable_mismatch_display() {
        let err = PatternError::VariableMismatch {
            value: "abc".into(),
            pattern: "^[0-9]+$".into(),
        };
        assert_eq!(
            err.to_string(),
            "variable value \"abc\" doesn't match expected pattern \"^[0-9]+$\""
        );
    }
}
