use parco::prelude::*;

/// `[`-delimited, comma-separated values, where a value is a word, a number
/// or another array.
pub fn nested() -> Parser<String> {
    let square_brackets = between(literal("["), literal("]"));
    let comma_separated = sep_by(literal(","));
    square_brackets(comma_separated(value())).named("array")
}

fn value() -> Parser<String> {
    lazy(|| choice([nested(), letters(), digits()])).named("value")
}

/// Words and numbers run together inside parentheses.
pub fn tokens() -> Parser<String> {
    between(literal("("), literal(")"))(many(choice([letters(), digits()])))
        .error_map(|e, position| format!("expected a parenthesized token run at index {position}: {e}"))
        .named("tokens")
}
