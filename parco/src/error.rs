use thiserror::Error;

/// Why a parse failed. Every variant records the byte offset it happened at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{matcher}: tried to match {expected}, but got unexpected end of input at index {position}")]
    UnexpectedEnd {
        matcher: &'static str,
        expected: String,
        position: usize,
    },

    #[error("literal: tried to match {expected:?} at index {position}, but got {found:?}")]
    LiteralMismatch {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("pattern: couldn't match /{pattern}/ at index {position}")]
    PatternMismatch { pattern: String, position: usize },

    #[error("choice: unable to match with any parser at index {position}")]
    ChoiceExhausted { position: usize },

    #[error("many1: unable to match any input using parser at index {position}")]
    EmptyRepetition { position: usize },

    #[error("sep_by1: unable to match any input using parser at index {position}")]
    EmptySeparatedList { position: usize },

    /// More than `limit` nested [`lazy`](crate::parsers::lazy) rules. Not
    /// recovered from by `choice` or the repetition combinators.
    #[error("lazy: nesting deeper than {limit} levels at index {position}")]
    NestingTooDeep { limit: usize, position: usize },

    /// A message layered over another failure by [`Parser::error_map`](crate::core::Parser::error_map).
    #[error("{message}")]
    Mapped {
        message: String,
        position: usize,
        #[source]
        cause: Box<ParseError>,
    },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedEnd { position, .. }
            | ParseError::LiteralMismatch { position, .. }
            | ParseError::PatternMismatch { position, .. }
            | ParseError::ChoiceExhausted { position }
            | ParseError::EmptyRepetition { position }
            | ParseError::EmptySeparatedList { position }
            | ParseError::NestingTooDeep { position, .. }
            | ParseError::Mapped { position, .. } => *position,
        }
    }

    /// Whether the whole parse must stop rather than try another alternative.
    pub fn is_fatal(&self) -> bool {
        matches!(self.root_cause(), ParseError::NestingTooDeep { .. })
    }

    /// The failure underneath any number of [`ParseError::Mapped`] layers.
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::Mapped { cause, .. } => cause.root_cause(),
            e => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_messages() {
        let err = ParseError::UnexpectedEnd {
            matcher: "literal",
            expected: "\"abc\"".to_string(),
            position: 0,
        };
        assert_eq!(
            err.to_string(),
            "literal: tried to match \"abc\", but got unexpected end of input at index 0"
        );

        let err = ParseError::LiteralMismatch {
            expected: "abc".to_string(),
            found: "deno".to_string(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "literal: tried to match \"abc\" at index 3, but got \"deno\""
        );

        let err = ParseError::ChoiceExhausted { position: 7 };
        assert_eq!(
            err.to_string(),
            "choice: unable to match with any parser at index 7"
        );
    }

    #[test]
    fn test_fatal() {
        let err = ParseError::NestingTooDeep {
            limit: 4,
            position: 5,
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "lazy: nesting deeper than 4 levels at index 5");

        let mapped = ParseError::Mapped {
            message: "too deep".to_string(),
            position: 5,
            cause: Box::new(err),
        };
        assert!(mapped.is_fatal());
        assert!(!ParseError::ChoiceExhausted { position: 0 }.is_fatal());
    }

    #[test]
    fn test_mapped_keeps_cause() {
        let cause = ParseError::PatternMismatch {
            pattern: "[0-9]+".to_string(),
            position: 2,
        };
        let err = ParseError::Mapped {
            message: "expected a number".to_string(),
            position: 2,
            cause: Box::new(cause.clone()),
        };

        assert_eq!(err.to_string(), "expected a number");
        assert_eq!(err.position(), 2);
        assert_eq!(err.root_cause(), &cause);
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("pattern: couldn't match /[0-9]+/ at index 2".to_string())
        );
    }
}
