use nom::{
    branch::alt,
    character::complete::{anychar, char, none_of, one_of},
    combinator::recognize,
    multi::{fold_many0, many0},
    sequence::{pair, preceded},
    IResult, Parser,
};

use crate::pgpass::{DELIMITER, DELIMITER_CHAR, ESCAPABLE, ESCAPE_CHAR};

/// One character of a field. A delimiter directly after an escape character
/// belongs to the field.
fn field_char(s: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(char(ESCAPE_CHAR), char(DELIMITER_CHAR))),
        recognize(none_of(DELIMITER)),
    ))
    .parse(s)
}

/// A raw field, escape sequences included. May be empty.
pub fn field(s: &str) -> IResult<&str, &str> {
    recognize(many0(field_char)).parse(s)
}

fn escape_sequence(s: &str) -> IResult<&str, char> {
    preceded(char(ESCAPE_CHAR), one_of(ESCAPABLE)).parse(s)
}

/// Resolve `\\` and `\:` into the escaped character. Any other backslash is
/// kept as-is.
pub fn unescaped(s: &str) -> IResult<&str, String> {
    fold_many0(
        alt((escape_sequence, anychar)),
        String::new,
        |mut acc, c| {
            acc.push(c);
            acc
        },
    )
    .parse(s)
}
