//! Read connection service files.
//! <https://www.postgresql.org/docs/current/libpq-pgservice.html>
//!
//! A service file groups connection parameters under named sections:
//!
//! ```text
//! # comment
//! [my-service]
//! host=db.example.com
//! dbname=appdb
//! ```
//!
//! The main functionality is documented in [`find_service`].

mod parser;

use std::io::{self, BufRead};
use thiserror::Error;

use crate::parameter::{Parameter, Parameters};

use self::parser::Line;

pub const FILENAME: &str = ".pg_service.conf";
pub const SYSCONFDIR_FILENAME: &str = "pg_service.conf";
pub const NAME_ENVIRONMENT_VAR: &str = "PGSERVICE";
pub const PATH_ENVIRONMENT_VAR: &str = "PGSERVICEFILE";
pub const SYSCONFDIR_ENVIRONMENT_VAR: &str = "PGSYSCONFDIR";
pub const COMMENT: char = '#';
pub const GROUP_START: char = '[';
pub const GROUP_END: char = ']';
pub const ASSIGNMENT: &str = "=";
pub const ASSIGNMENT_CHAR: char = '=';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Searching,
    InTargetGroup,
    Done,
}

/// Returns the parameters defined for `service`.
///
/// ```
/// # use pg_conninfo::{service::find_service, Parameter};
/// # fn main() -> anyhow::Result<()> {
/// let contents = "[other]\nuser=bob\n[mine]\nuser=alice\nport=6543\n";
/// let params = find_service("mine", contents.as_bytes())?.unwrap();
/// assert_eq!(params.get(&Parameter::User).map(String::as_str), Some("alice"));
/// assert_eq!(params.len(), 2);
/// # Ok(())
/// # }
/// ```
///
/// `Ok(None)` means the file has no `[service]` section; a section without any
/// settings yields an empty map. Only the first section with the given name is
/// read, and reading stops at the next section header.
///
/// Inside the section every line which is not blank or a comment must be a
/// `keyword=value` setting for a known [`Parameter`] other than
/// [`Parameter::Service`]. The value is everything after the first `=`, with
/// only the end of the line trimmed. A repeated keyword overrides earlier ones.
///
/// Lines outside the section are not checked.
pub fn find_service<R: BufRead>(
    service: &str,
    reader: R,
) -> Result<Option<Parameters>, ServiceFileError> {
    let mut state = State::Searching;
    let mut params: Option<Parameters> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = i + 1;

        match (state, parser::line(&line)) {
            (_, Line::Ignored) => {}
            (State::InTargetGroup, Line::Group(_)) => state = State::Done,
            (_, Line::Group(name)) => {
                if name == Some(service) {
                    state = State::InTargetGroup;
                    params = Some(Parameters::new());
                }
            }
            (State::InTargetGroup, Line::Setting(keyword, value)) => {
                let parameter = setting_parameter(keyword)
                    .map_err(|kind| MalformedServiceFile::new(kind, line_number, &line))?;
                if let Some(params) = params.as_mut() {
                    params.insert(parameter, value.to_string());
                }
            }
            (State::InTargetGroup, Line::Invalid) => {
                return Err(
                    MalformedServiceFile::new(MalformedKind::Syntax, line_number, &line).into(),
                );
            }
            (_, Line::Setting(..) | Line::Invalid) => {}
        }

        if state == State::Done {
            break;
        }
    }

    Ok(params)
}

fn setting_parameter(keyword: &str) -> Result<Parameter, MalformedKind> {
    match Parameter::from_keyword(keyword) {
        Some(Parameter::Service) => Err(MalformedKind::NestedService),
        Some(parameter) => Ok(parameter),
        None => Err(MalformedKind::UnknownKeyword),
    }
}

/// An error encountered while reading a service file.
#[derive(Error, Debug)]
pub enum ServiceFileError {
    #[error("{0}")]
    Malformed(#[from] MalformedServiceFile),
    /// We encountered an I/O error (or invalid UTF-8) while reading the file.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// The ways a line inside the requested section may be invalid.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// The line is not a `keyword=value` setting.
    #[error("syntax error in service file")]
    Syntax,
    /// The keyword does not name a connection parameter.
    #[error("syntax error in service file (unrecognized keyword)")]
    UnknownKeyword,
    #[error("nested service specifications not supported in service file")]
    NestedService,
}

/// A service file whose requested section contains an invalid line.
///
/// The offending line is kept for diagnostics, but is not part of the
/// [`Display`][std::fmt::Display] output: it may contain a password.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}, line {line_number}")]
pub struct MalformedServiceFile {
    kind: MalformedKind,
    line_number: usize,
    line: String,
}

impl MalformedServiceFile {
    fn new(kind: MalformedKind, line_number: usize, line: &str) -> Self {
        Self {
            kind,
            line_number,
            line: line.to_string(),
        }
    }

    pub fn kind(&self) -> MalformedKind {
        self.kind
    }

    /// The 1-based number of the offending line.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// The offending line, as it appeared in the file.
    pub fn line(&self) -> &str {
        &self.line
    }
}
