//! A small parser-combinator engine.
//!
//! Parsers are built by composing [`matchers`] with the functions in
//! [`parsers`], then driven once with [`Parser::run`](core::Parser::run).
//! Every step produces a new [`ParseState`](core::ParseState), which is what
//! makes backtracking in [`choice`](parsers::choice) free.
//!
//! ```
//! use parco::prelude::*;
//!
//! fn array() -> Parser<String> {
//!     let value = lazy(|| choice([array(), letters(), digits()]));
//!     between(literal("["), literal("]"))(sep_by(literal(","))(value))
//! }
//!
//! let state = array().run("[2,[123,abc],qwerty]");
//! assert!(state.is_complete());
//! assert_eq!(state.result().to_string(), "[2, [123, abc], qwerty]");
//! ```

pub mod combinators;
pub mod core;
pub mod error;
pub mod matchers;
#[cfg(feature = "serde")]
mod serialize;

pub use combinators::parsers;

pub mod prelude {
    pub use crate::core::{Output, ParseState, Parser};
    pub use crate::error::ParseError;
    pub use crate::matchers::{digits, letters, literal, pattern, pattern_from};
    pub use crate::parsers::*;
}
