use nom::{character::complete::char, multi::separated_list0, Parser};

use crate::pgpass::DELIMITER_CHAR;

use self::field::field;

pub mod field;

/// Split a line on every delimiter not directly preceded by the escape
/// character. Fields are returned raw (still escaped). Trailing empty fields
/// are dropped, so `a:b:c:d:` has four fields.
pub fn fields(line: &str) -> Vec<&str> {
    let mut fields = match separated_list0(char(DELIMITER_CHAR), field).parse(line) {
        Ok((_remaining, fields)) => fields,
        Err(_) => return Vec::new(),
    };
    while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Resolve the escape sequences of a password field.
pub fn unescape(s: &str) -> String {
    match field::unescaped(s) {
        Ok((_remaining, unescaped)) => unescaped,
        // unescaped accepts every input
        Err(_) => s.to_string(),
    }
}
