//! Primitive matchers: the only parsers that inspect raw input.

use std::sync::OnceLock;

use log::trace;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    core::{Output, ParseState, Parser},
    error::ParseError,
};

/// Characters of remaining input quoted in a literal mismatch.
const PREVIEW_LEN: usize = 10;

fn preview(rest: &str) -> String {
    rest.graphemes(true).take(PREVIEW_LEN).collect()
}

/// Matches `expected` exactly at the current position.
pub fn literal(expected: impl Into<String>) -> Parser<String> {
    let expected: String = expected.into();
    Parser::new(format!("literal({expected:?})"), move |state: &ParseState<String>| {
        if state.failed() {
            return state.cleared();
        }
        let position = state.position();
        let rest = state.remaining();
        trace!("literal: trying {expected:?} at index {position}");
        if rest.is_empty() {
            return state.with_error(ParseError::UnexpectedEnd {
                matcher: "literal",
                expected: format!("{expected:?}"),
                position,
            });
        }
        if !rest.starts_with(expected.as_str()) {
            return state.with_error(ParseError::LiteralMismatch {
                expected: expected.clone(),
                found: preview(rest),
                position,
            });
        }
        state.with_progress(position + expected.len(), Output::Value(expected.clone()))
    })
}

/// Matches a regular expression anchored at the current position.
pub fn pattern(source: &str) -> Result<Parser<String>, regex::Error> {
    let regex = Regex::new(&format!("^(?:{source})"))?;
    Ok(matching(regex, source.to_owned()))
}

/// Like [`pattern`], for an already compiled expression. The expression is
/// recompiled anchored, so options set through `RegexBuilder` rather than
/// inline flags are not kept.
pub fn pattern_from(regex: Regex) -> Parser<String> {
    let source = regex.as_str().to_owned();
    let anchored = Regex::new(&format!("^(?:{source})")).unwrap_or(regex);
    matching(anchored, source)
}

fn matching(regex: Regex, source: String) -> Parser<String> {
    Parser::new(format!("pattern(/{source}/)"), move |state: &ParseState<String>| {
        if state.failed() {
            return state.cleared();
        }
        let position = state.position();
        let rest = state.remaining();
        trace!("pattern: trying /{source}/ at index {position}");
        if rest.is_empty() {
            return state.with_error(ParseError::UnexpectedEnd {
                matcher: "pattern",
                expected: format!("/{source}/"),
                position,
            });
        }
        match regex.find(rest) {
            Some(m) if m.start() == 0 => {
                state.with_progress(position + m.end(), Output::Value(m.as_str().to_owned()))
            }
            _ => state.with_error(ParseError::PatternMismatch {
                pattern: source.clone(),
                position,
            }),
        }
    })
}

fn standard(cell: &'static OnceLock<Regex>, source: &'static str, name: &'static str) -> Parser<String> {
    let regex = cell.get_or_init(|| {
        Regex::new(&format!("^(?:{source})")).expect("standard patterns are valid")
    });
    matching(regex.clone(), source.to_owned()).named(name)
}

/// One or more ASCII letters.
pub fn letters() -> Parser<String> {
    static LETTERS: OnceLock<Regex> = OnceLock::new();
    standard(&LETTERS, "[A-Za-z]+", "letters")
}

/// One or more ASCII digits.
pub fn digits() -> Parser<String> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    standard(&DIGITS, "[0-9]+", "digits")
}
