use std::cell::RefCell;

use itertools::Itertools;
use log::trace;

use crate::{
    core::{Output, ParseState, Parser},
    error::ParseError,
};

pub mod parsers {

    use super::*;

    /// Runs `parsers` one after the other, collecting their results in order.
    /// Fails at the first parser that fails.
    pub fn sequence_of<T: 'static>(parsers: impl IntoIterator<Item = Parser<T>>) -> Parser<T> {
        let parsers: Vec<Parser<T>> = parsers.into_iter().collect();
        let name = format!("sequence_of({})", parsers.iter().map(Parser::name).join(", "));
        Parser::new(name, move |state| {
            if state.failed() {
                return state.cleared();
            }
            let mut results = Vec::with_capacity(parsers.len());
            let mut next = state.cleared();
            for parser in &parsers {
                let (result, after) = parser.apply(&next).take_output();
                if after.failed() {
                    return after;
                }
                results.push(result);
                next = after;
            }
            next.with_result(Output::List(results))
        })
    }

    /// The first of `parsers` to succeed, each tried from the same state.
    pub fn choice<T: 'static>(parsers: impl IntoIterator<Item = Parser<T>>) -> Parser<T> {
        let parsers: Vec<Parser<T>> = parsers.into_iter().collect();
        let name = format!("choice({})", parsers.iter().map(Parser::name).join(" | "));
        Parser::new(name, move |state| {
            if state.failed() {
                return state.cleared();
            }
            for parser in &parsers {
                let next = parser.apply(state);
                if next.error().map_or(true, ParseError::is_fatal) {
                    return next;
                }
                trace!(
                    "choice: {} failed at index {}",
                    parser.name(),
                    state.position()
                );
            }
            state.with_error(ParseError::ChoiceExhausted {
                position: state.position(),
            })
        })
    }

    /// Zero or more `parser`, as a list. Never fails on its own.
    pub fn many<T: 'static>(parser: Parser<T>) -> Parser<T> {
        let name = format!("many({})", parser.name());
        Parser::new(name, move |state| repeat(&parser, state))
    }

    pub fn many1<T: 'static>(parser: Parser<T>) -> Parser<T> {
        let name = format!("many1({})", parser.name());
        Parser::new(name, move |state| {
            let next = repeat(&parser, state);
            if !next.failed() && next.result().is_empty() {
                return next.with_error(ParseError::EmptyRepetition {
                    position: next.position(),
                });
            }
            next
        })
    }

    /// Zero or more `value`s separated by `separator`. Only the values are kept.
    pub fn sep_by<S, T>(separator: Parser<S>) -> impl Fn(Parser<T>) -> Parser<T>
    where
        S: 'static,
        T: 'static,
    {
        move |value: Parser<T>| {
            let separator = separator.clone();
            let name = format!("sep_by({}, {})", separator.name(), value.name());
            Parser::new(name, move |state| separated(&separator, &value, state))
        }
    }

    /// Like [`sep_by`], but at least one value is required.
    pub fn sep_by1<S, T>(separator: Parser<S>) -> impl Fn(Parser<T>) -> Parser<T>
    where
        S: 'static,
        T: 'static,
    {
        move |value: Parser<T>| {
            let separator = separator.clone();
            let name = format!("sep_by1({}, {})", separator.name(), value.name());
            Parser::new(name, move |state| {
                let next = separated(&separator, &value, state);
                if !next.failed() && next.result().is_empty() {
                    return next.with_error(ParseError::EmptySeparatedList {
                        position: next.position(),
                    });
                }
                next
            })
        }
    }

    pub fn between<L, R, T>(left: Parser<L>, right: Parser<R>) -> impl Fn(Parser<T>) -> Parser<T>
    where
        L: 'static,
        R: 'static,
        T: 'static,
    {
        move |content: Parser<T>| {
            let (left, right) = (left.clone(), right.clone());
            let name = format!(
                "between({}, {}, {})",
                left.name(),
                content.name(),
                right.name()
            );
            Parser::new(name, move |state| {
                if state.failed() {
                    return state.cleared();
                }
                let after_left = left.apply(&state.cleared());
                if after_left.failed() {
                    return after_left.cleared();
                }
                let (result, after_content) = content.apply(&after_left.cleared()).take_output();
                if after_content.failed() {
                    return after_content;
                }
                let after_right = right.apply(&after_content.cleared());
                if after_right.failed() {
                    return after_right.cleared();
                }
                after_right.with_result(result)
            })
        }
    }

    /// Defers building a parser until it is first applied, so grammar rules
    /// can refer to themselves.
    ///
    /// Each enclosing `lazy` counts as one level of nesting. Past
    /// [`MAX_DEPTH`] levels the parse fails with
    /// [`ParseError::NestingTooDeep`] instead of exhausting the stack.
    pub fn lazy<T: 'static>(build: impl Fn() -> Parser<T> + 'static) -> Parser<T> {
        lazy_bounded(MAX_DEPTH, build)
    }

    /// [`lazy`] with its own nesting limit.
    pub fn lazy_bounded<T: 'static>(
        max_depth: usize,
        build: impl Fn() -> Parser<T> + 'static,
    ) -> Parser<T> {
        let deferred = Deferred {
            parser: RefCell::new(None),
            build: Box::new(build),
            max_depth,
        };
        Parser::new("lazy", move |state| deferred.apply(state))
    }
}

/// Default nesting limit of [`parsers::lazy`]. Fits the 2 MiB stack of a
/// spawned thread with unoptimized builds.
pub const MAX_DEPTH: usize = 256;

struct Deferred<T> {
    parser: RefCell<Option<Parser<T>>>,
    build: Box<dyn Fn() -> Parser<T>>,
    max_depth: usize,
}

impl<T: 'static> Deferred<T> {
    fn get_parser(&self) -> Parser<T> {
        let built = self.parser.borrow().clone();
        if let Some(parser) = built {
            return parser;
        }
        let parser = (self.build)();
        trace!("lazy: built {}", parser.name());
        self.parser.borrow_mut().replace(parser.clone());
        parser
    }

    fn apply(&self, state: &ParseState<T>) -> ParseState<T> {
        if state.failed() {
            return state.cleared();
        }
        let depth = state.depth();
        if depth >= self.max_depth {
            return state.with_error(ParseError::NestingTooDeep {
                limit: self.max_depth,
                position: state.position(),
            });
        }
        let inner = state.cleared().at_depth(depth + 1);
        self.get_parser().apply(&inner).at_depth(depth)
    }
}

fn repeat<T: 'static>(parser: &Parser<T>, state: &ParseState<T>) -> ParseState<T> {
    if state.failed() {
        return state.cleared();
    }
    let mut results = vec![];
    let mut current = state.cleared();
    loop {
        let (result, next) = parser.apply(&current).take_output();
        if next.error().is_some_and(ParseError::is_fatal) {
            return next;
        }
        if next.failed() {
            break;
        }
        results.push(result);
        let stalled = next.position() == current.position();
        current = next;
        if stalled {
            break;
        }
    }
    current.with_result(Output::List(results))
}

fn separated<S: 'static, T: 'static>(
    separator: &Parser<S>,
    value: &Parser<T>,
    state: &ParseState<T>,
) -> ParseState<T> {
    if state.failed() {
        return state.cleared();
    }
    let mut results = vec![];
    let mut current = state.cleared();
    loop {
        let start = current.position();
        let (result, after_value) = value.apply(&current).take_output();
        if after_value.error().is_some_and(ParseError::is_fatal) {
            return after_value;
        }
        if after_value.failed() {
            break;
        }
        results.push(result);
        let after_separator = separator.apply(&after_value.cleared());
        if after_separator.error().is_some_and(ParseError::is_fatal) {
            return after_separator.cleared();
        }
        if after_separator.failed() {
            current = after_value;
            break;
        }
        current = after_separator.cleared();
        if current.position() == start {
            break;
        }
    }
    current.with_result(Output::List(results))
}
