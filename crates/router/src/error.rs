//! Pattern compilation errors.

use thiserror::Error;

/// An error raised while compiling a route pattern.
///
/// Matching itself never fails; only malformed pattern text is rejected, and
/// that happens once at registration time. Every variant carries the original
/// pattern and, where it is meaningful, the byte index the compiler had
/// reached when it gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `{` parameter section was never closed with `}`.
    #[error("unterminated parameter, missing '}}' in pattern {pattern:?} at index {index}")]
    UnterminatedParameter { pattern: String, index: usize },

    /// A `[` optional section was never closed with `]`.
    #[error("unterminated optional section, missing ']' in pattern {pattern:?} at index {index}")]
    UnterminatedOptional { pattern: String, index: usize },

    /// A `[` optional section was opened inside another one.
    #[error("optional sections cannot nest in pattern {pattern:?} at index {index}")]
    NestedOptional { pattern: String, index: usize },

    /// A greedy `{+name}` parameter carried a custom `:regex` part.
    #[error("greedy parameter cannot have a custom regex in pattern {pattern:?} at index {index}")]
    GreedyWithRegex { pattern: String, index: usize },

    /// The assembled expression was rejected by the regex engine, typically
    /// because of an invalid custom `{name:regex}` part.
    #[error("invalid regex in pattern {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

impl PatternError {
    pub(crate) fn unterminated_parameter<S: ToString + ?Sized>(pattern: &S, index: usize) -> Self {
        Self::UnterminatedParameter { pattern: pattern.to_string(), index }
    }

    pub(crate) fn unterminated_optional<S: ToString + ?Sized>(pattern: &S, index: usize) -> Self {
        Self::UnterminatedOptional { pattern: pattern.to_string(), index }
    }

    pub(crate) fn nested_optional<S: ToString + ?Sized>(pattern: &S, index: usize) -> Self {
        Self::NestedOptional { pattern: pattern.to_string(), index }
    }

    pub(crate) fn greedy_with_regex<S: ToString + ?Sized>(pattern: &S, index: usize) -> Self {
        Self::GreedyWithRegex { pattern: pattern.to_string(), index }
    }

    pub(crate) fn invalid_regex<S: ToString + ?Sized, R: ToString + ?Sized>(
        pattern: &S,
        reason: &R,
    ) -> Self {
        Self::InvalidRegex {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_pattern_and_index() {
        let error = PatternError::unterminated_parameter("/a/{id", 6);
        assert_eq!(
            error.to_string(),
            "unterminated parameter, missing '}' in pattern \"/a/{id\" at index 6"
        );
    }

    #[test]
    fn display_names_regex_reason() {
        let error = PatternError::invalid_regex("/a/{id:[}", "unclosed character class");
        assert_eq!(
            error.to_string(),
            "invalid regex in pattern \"/a/{id:[}\": unclosed character class"
        );
    }
}
