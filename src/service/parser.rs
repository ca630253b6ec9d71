use nom::{
    bytes::complete::take_until,
    character::complete::char,
    combinator::rest,
    sequence::{preceded, separated_pair},
    IResult, Parser,
};

use crate::service::{ASSIGNMENT, ASSIGNMENT_CHAR, COMMENT, GROUP_END, GROUP_START};

/// The shape of a single (trimmed) service file line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Blank, or a comment.
    Ignored,
    /// A group header. `None` if the closing bracket is missing, in which case
    /// the group never matches a service name.
    Group(Option<&'a str>),
    /// `keyword=value`. The value is taken verbatim.
    Setting(&'a str, &'a str),
    /// Anything else.
    Invalid,
}

fn group(s: &str) -> IResult<&str, Option<&str>> {
    let (remaining, name) = preceded(char(GROUP_START), rest).parse(s)?;
    Ok((remaining, name.strip_suffix(GROUP_END)))
}

fn setting(s: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_until(ASSIGNMENT), char(ASSIGNMENT_CHAR), rest).parse(s)
}

/// Classify a line. Surrounding ASCII whitespace and control characters are
/// removed first; other Unicode whitespace is kept.
pub fn line(s: &str) -> Line<'_> {
    let s = s.trim_matches(|c: char| c <= ' ');
    if s.is_empty() || s.starts_with(COMMENT) {
        Line::Ignored
    } else if let Ok((_, name)) = group(s) {
        Line::Group(name)
    } else if let Ok((_, (keyword, value))) = setting(s) {
        Line::Setting(keyword, value)
    } else {
        Line::Invalid
    }
}
