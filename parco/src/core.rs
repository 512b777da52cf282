use std::{fmt, rc::Rc};

use itertools::Itertools;
use log::debug;

use crate::error::ParseError;

/// A parse result: either a single leaf value, or the ordered results of
/// sub-parses, which may themselves be lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output<T> {
    Value(T),
    List(Vec<Output<T>>),
}

impl<T> Output<T> {
    pub fn empty() -> Self {
        Output::List(vec![])
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Output::List(items) if items.is_empty())
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Output::Value(v) => Some(v),
            Output::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Output<T>]> {
        match self {
            Output::Value(_) => None,
            Output::List(items) => Some(items),
        }
    }

    pub fn into_list(self) -> Option<Vec<Output<T>>> {
        match self {
            Output::Value(_) => None,
            Output::List(items) => Some(items),
        }
    }

    pub fn nth(self, i: usize) -> Option<Output<T>> {
        self.into_list().and_then(|items| items.into_iter().nth(i))
    }

    /// All leaves, depth first, left to right.
    pub fn flatten(self) -> Vec<T> {
        let mut leaves = vec![];
        let mut pending = vec![self];
        while let Some(next) = pending.pop() {
            match next {
                Output::Value(v) => leaves.push(v),
                Output::List(items) => pending.extend(items.into_iter().rev()),
            }
        }
        leaves
    }

    pub fn map_values<U>(self, f: &impl Fn(T) -> U) -> Output<U> {
        match self {
            Output::Value(v) => Output::Value(f(v)),
            Output::List(items) => Output::List(items.into_iter().map(|o| o.map_values(f)).collect()),
        }
    }
}

impl<T> Default for Output<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<T> for Output<T> {
    fn from(value: T) -> Self {
        Output::Value(value)
    }
}

impl<T> FromIterator<Output<T>> for Output<T> {
    fn from_iter<I: IntoIterator<Item = Output<T>>>(iter: I) -> Self {
        Output::List(iter.into_iter().collect())
    }
}

impl<T: fmt::Display> fmt::Display for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Value(v) => v.fmt(f),
            Output::List(items) => write!(f, "[{}]", items.iter().join(", ")),
        }
    }
}

/// A snapshot of parsing progress. Never updated in place: every helper
/// below returns a new state.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseState<T> {
    text: Rc<str>,
    position: usize,
    result: Output<T>,
    error: Option<ParseError>,
    depth: usize,
}

impl<T> ParseState<T> {
    pub fn new(text: &str) -> Self {
        Self {
            text: Rc::from(text),
            position: 0,
            result: Output::empty(),
            error: None,
            depth: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The input not yet consumed. Empty if the position is past the end of
    /// the text or not on a character boundary.
    pub fn remaining(&self) -> &str {
        self.text.get(self.position..).unwrap_or("")
    }

    /// Byte offset into [`ParseState::text`].
    pub fn position(&self) -> usize {
        self.position
    }

    /// How many [`lazy`](crate::parsers::lazy) rules enclose this state.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn result(&self) -> &Output<T> {
        &self.result
    }

    pub fn into_output(self) -> Output<T> {
        self.result
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// The rendered error, or an empty string on success.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Succeeded and consumed the whole input.
    pub fn is_complete(&self) -> bool {
        !self.failed() && self.position == self.text.len()
    }

    pub fn into_result(self) -> Result<Output<T>, ParseError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.result),
        }
    }

    /// `position` must be a character boundary of the text, at most its length.
    pub fn with_progress<U>(&self, position: usize, result: Output<U>) -> ParseState<U> {
        ParseState {
            text: Rc::clone(&self.text),
            position,
            result,
            error: self.error.clone(),
            depth: self.depth,
        }
    }

    pub fn with_result<U>(&self, result: Output<U>) -> ParseState<U> {
        self.with_progress(self.position, result)
    }

    /// Marks the state as failed. The result is always cleared.
    pub fn with_error<U>(&self, error: ParseError) -> ParseState<U> {
        ParseState {
            text: Rc::clone(&self.text),
            position: self.position,
            result: Output::empty(),
            error: Some(error),
            depth: self.depth,
        }
    }

    /// Same text, position and error, with the result cleared.
    pub fn cleared<U>(&self) -> ParseState<U> {
        self.with_result(Output::empty())
    }

    pub(crate) fn at_depth(self, depth: usize) -> Self {
        Self { depth, ..self }
    }

    pub(crate) fn take_output<U>(self) -> (Output<T>, ParseState<U>) {
        let ParseState {
            text,
            position,
            result,
            error,
            depth,
        } = self;
        let state = ParseState {
            text,
            position,
            result: Output::empty(),
            error,
            depth,
        };
        (result, state)
    }
}

type Transform<T> = dyn Fn(&ParseState<T>) -> ParseState<T>;

/// A named state transition. Cloning is cheap and shares the transition.
///
/// The incoming state's result is never read, so a parser can be applied to
/// any state once it has been re-typed with [`ParseState::cleared`].
pub struct Parser<T> {
    name: Rc<str>,
    transform: Rc<Transform<T>>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            transform: Rc::clone(&self.transform),
        }
    }
}

impl<T> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Parser<T> {
    pub fn new(
        name: impl Into<Rc<str>>,
        transform: impl Fn(&ParseState<T>) -> ParseState<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            transform: Rc::new(transform),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn named(self, name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn apply(&self, state: &ParseState<T>) -> ParseState<T> {
        (self.transform)(state)
    }

    /// Parses `text` from the start. Never panics: failure is reported
    /// through the returned state.
    pub fn run(&self, text: &str) -> ParseState<T> {
        debug!("{}: parsing {} bytes", self.name, text.len());
        let state = self.apply(&ParseState::new(text));
        match state.error() {
            Some(e) => debug!("{}: failed: {e}", self.name),
            None => debug!("{}: matched up to index {}", self.name, state.position()),
        }
        state
    }

    pub fn map<U, F>(self, f: F) -> Parser<U>
    where
        F: Fn(Output<T>) -> Output<U> + 'static,
        U: 'static,
    {
        let name = format!("map({})", self.name);
        Parser::new(name, move |state: &ParseState<U>| {
            let next = self.apply(&state.cleared());
            if next.failed() {
                return next.cleared();
            }
            let (result, next) = next.take_output::<U>();
            next.with_result(f(result))
        })
    }

    /// Picks the next parser from what was just parsed.
    pub fn chain<U, F>(self, f: F) -> Parser<U>
    where
        F: Fn(Output<T>) -> Parser<U> + 'static,
        U: 'static,
    {
        let name = format!("chain({})", self.name);
        Parser::new(name, move |state: &ParseState<U>| {
            let next = self.apply(&state.cleared());
            if next.failed() {
                return next.cleared();
            }
            let (result, next) = next.take_output();
            f(result).apply(&next)
        })
    }

    /// Rewrites the error message of a failed parse. Successes pass through.
    pub fn error_map<F>(self, f: F) -> Parser<T>
    where
        F: Fn(&ParseError, usize) -> String + 'static,
    {
        let name = self.name.clone();
        Parser::new(name, move |state| {
            let next = self.apply(state);
            match next.error().cloned() {
                None => next,
                Some(cause) => {
                    let position = next.position();
                    let error = ParseError::Mapped {
                        message: f(&cause, position),
                        position,
                        cause: Box::new(cause),
                    };
                    next.with_error(error)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::matchers::{digits, letters, literal};

    fn leaf(s: &str) -> Output<String> {
        Output::Value(s.to_string())
    }

    #[test]
    fn test_initial_state() {
        let state = ParseState::<String>::new("abc");
        assert_eq!(state.text(), "abc");
        assert_eq!(state.position(), 0);
        assert!(state.result().is_empty());
        assert!(!state.failed());
        assert_eq!(state.error_message(), "");
    }

    #[test]
    fn test_helpers_leave_original_untouched() {
        let state = ParseState::<String>::new("abc");
        let moved = state.with_progress(2, leaf("ab"));
        let failed: ParseState<String> = moved.with_error(ParseError::ChoiceExhausted { position: 2 });

        assert_eq!(state.position(), 0);
        assert!(state.result().is_empty());
        assert_eq!(moved.position(), 2);
        assert_eq!(moved.result(), &leaf("ab"));
        assert!(failed.failed());
        assert!(failed.result().is_empty());
        assert_eq!(failed.position(), 2);
        assert_eq!(failed.remaining(), "c");
    }

    #[test]
    fn test_remaining_out_of_range() {
        let state = ParseState::<String>::new("héllo");
        let past_end: ParseState<String> = state.with_progress(9, Output::empty());
        let mid_char: ParseState<String> = state.with_progress(2, Output::empty());
        assert_eq!(past_end.remaining(), "");
        assert_eq!(mid_char.remaining(), "");

        let next = literal("llo").apply(&mid_char);
        assert!(matches!(next.error(), Some(ParseError::UnexpectedEnd { position: 2, .. })));
    }

    #[test]
    fn test_output_shape() {
        let out: Output<String> = [leaf("a"), [leaf("b"), leaf("c")].into_iter().collect()]
            .into_iter()
            .collect();
        assert_eq!(out.to_string(), "[a, [b, c]]");
        assert_eq!(out.clone().nth(0), Some(leaf("a")));
        assert_eq!(out.flatten(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_map() {
        let p = digits().map(|out| out.map_values(&|d: String| d.parse::<u32>().unwrap_or(0)));
        let state = p.run("42abc");
        assert_eq!(state.result(), &Output::Value(42));
        assert_eq!(state.position(), 2);

        let state = p.run("abc");
        assert!(state.failed());
        assert!(state.result().is_empty());
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn test_chain_picks_next_parser() {
        let tagged = letters().chain(|kind| match kind.value().map(String::as_str) {
            Some("number") => literal(":").chain(|_| digits()),
            _ => literal(":").chain(|_| letters()),
        });

        let state = tagged.run("number:42");
        assert_eq!(state.result(), &leaf("42"));
        assert!(state.is_complete());

        let state = tagged.run("string:hello");
        assert_eq!(state.result(), &leaf("hello"));

        let state = tagged.run("number:hello");
        assert!(state.failed());
        assert_eq!(state.position(), 7);
    }

    #[test]
    fn test_chain_short_circuits() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let p = digits().chain(move |_| {
            counter.set(counter.get() + 1);
            letters()
        });

        let state = p.run("abc");
        assert!(state.failed());
        assert_eq!(calls.get(), 0);

        let state = p.run("1abc");
        assert!(!state.failed());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_error_map() {
        let p = digits().error_map(|e, position| format!("expected a number at {position} ({e})"));

        let state = p.run("abc");
        assert_eq!(
            state.error_message(),
            "expected a number at 0 (pattern: couldn't match /[0-9]+/ at index 0)"
        );
        assert!(matches!(
            state.error().map(ParseError::root_cause),
            Some(ParseError::PatternMismatch { .. })
        ));

        let state = p.run("12");
        assert!(!state.failed());
        assert_eq!(state.result(), &leaf("12"));
    }

    #[test]
    fn test_names() {
        let p = literal("if");
        assert_eq!(p.name(), "literal(\"if\")");
        assert_eq!(p.clone().named("keyword").name(), "keyword");
        assert_eq!(format!("{:?}", letters()), "Parser { name: \"letters\", .. }");
    }
}
