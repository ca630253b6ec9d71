//! Look up passwords stored in the pgpass format.
//! <https://www.postgresql.org/docs/current/libpq-pgpass.html>
//!
//! The main functionality is documented in [`find_password`].

mod parser;
pub mod permissions;

use log::{debug, trace};
use std::{fmt, io::BufRead};

pub use self::permissions::FilePermissions;

// Constants copied from Postgres documentation
pub const FILENAME: &str = ".pgpass";
pub const FILENAME_WINDOWS: &str = "pgpass.conf";
pub const DIRECTORY_WINDOWS: &str = "postgresql";
pub const PATH_ENVIRONMENT_VAR: &str = "PGPASSFILE";
pub const DELIMITER: &str = ":";
pub const DELIMITER_CHAR: char = ':';
pub const ESCAPE_CHAR: char = '\\';
pub const WILDCARD: &str = "*";
/// Characters which must be escaped in a password.
pub const ESCAPABLE: &str = "\\:";

/// Host searched for when none is given, or when the host is the default
/// socket directory.
pub const DEFAULT_HOST: &str = "localhost";
/// libpq's compiled-in `DEFAULT_PGSOCKET_DIR`. A libpq built with a different
/// socket directory will substitute `localhost` for that directory instead.
pub const DEFAULT_SOCKET_DIR: &str = "/tmp";
pub const DEFAULT_PORT: &str = "5432";

const MIN_FIELD_COUNT: usize = 4;
const MAX_FIELD_COUNT: usize = 5;

/// Search a pgpass file for the password of the first entry matching the given
/// connection parameters.
///
/// ```
/// # use pg_conninfo::pgpass::find_password;
/// let pgpass = "db.example.com:*:*:alice:secret\n*:*:*:*:fallback\n";
/// let password = find_password(
///     Some("db.example.com"),
///     None,
///     Some("appdb"),
///     Some("alice"),
///     pgpass.as_bytes(),
/// );
/// assert_eq!(password.as_deref(), Some("secret"));
/// ```
///
/// No lookup happens unless both `database` and `user` are non-empty. See
/// [`PassfileQuery::new`] for how missing values are defaulted.
///
/// # Format
///
/// Each line has the form `hostname:port:database:username:password`. The
/// first four fields may be `*`, which matches anything; all other values are
/// compared exactly. Inside the password, `\:` and `\\` stand for `:` and `\`.
///
/// Lines which do not have four or five fields never match, which is also how
/// comments (`#...`) are skipped. A matching line with only four fields yields
/// no password, and the search continues.
///
/// Read errors end the search without a password.
pub fn find_password<R: BufRead>(
    host: Option<&str>,
    port: Option<&str>,
    database: Option<&str>,
    user: Option<&str>,
    reader: R,
) -> Option<String> {
    PassfileQuery::new(host, port, database, user)?.find_password(reader)
}

/// Escape a password for inclusion in a pgpass file.
pub fn escape(s: &str) -> String {
    let mut output = String::with_capacity(s.len());
    escape_into(s, &mut output);
    output
}

/// Escape a password, writing the result into the supplied string.
pub fn escape_into(s: &str, output: &mut String) {
    for c in s.chars() {
        if ESCAPABLE.contains(c) {
            output.push(ESCAPE_CHAR);
        }
        output.push(c);
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Normalized connection parameters to match pgpass entries against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PassfileQuery {
    pub host: String,
    pub port: String,
    pub database: String,
    pub user: String,
}

impl PassfileQuery {
    /// Normalize connection parameters the way libpq does before consulting the
    /// password file.
    ///
    /// Returns `None` if the database or user is missing or empty; libpq never
    /// looks up a password without both. A missing host, or the default socket
    /// directory, becomes [`DEFAULT_HOST`]. A missing port becomes
    /// [`DEFAULT_PORT`].
    pub fn new(
        host: Option<&str>,
        port: Option<&str>,
        database: Option<&str>,
        user: Option<&str>,
    ) -> Option<Self> {
        let database = non_empty(database)?;
        let user = non_empty(user)?;
        let host = match non_empty(host) {
            None | Some(DEFAULT_SOCKET_DIR) => DEFAULT_HOST,
            Some(host) => host,
        };
        let port = non_empty(port).unwrap_or(DEFAULT_PORT);

        Some(Self {
            host: host.to_string(),
            port: port.to_string(),
            database: database.to_string(),
            user: user.to_string(),
        })
    }

    /// Returns the password of the first matching five-field entry.
    pub fn find_password<R: BufRead>(&self, reader: R) -> Option<String> {
        for (i, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    debug!("Stopped reading pgpass file at line {}: {}", i + 1, e);
                    return None;
                }
            };
            let Some(entry) = Entry::parse(&line) else {
                continue;
            };
            if !entry.matches(self) {
                continue;
            }
            match entry.password() {
                Some(password) => {
                    trace!("Using pgpass entry on line {}", i + 1);
                    return Some(password);
                }
                None => trace!("pgpass entry on line {} has no password", i + 1),
            }
        }

        None
    }
}

/// A field of a pgpass entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern<'a> {
    /// `*`, which matches any value.
    Any,
    /// A literal value. Escape sequences are not resolved outside of the
    /// password field.
    Exact(&'a str),
}

impl<'a> Pattern<'a> {
    fn parse(field: &'a str) -> Self {
        if field == WILDCARD {
            Pattern::Any
        } else {
            Pattern::Exact(field)
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(field) => *field == value,
        }
    }
}

/// One line of a pgpass file.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Entry<'a> {
    pub host: Pattern<'a>,
    pub port: Pattern<'a>,
    pub database: Pattern<'a>,
    pub user: Pattern<'a>,
    /// The password field, still escaped. Absent on four-field lines.
    raw_password: Option<&'a str>,
}

impl<'a> Entry<'a> {
    /// Parse a line, returning `None` unless it has four or five fields.
    pub fn parse(line: &'a str) -> Option<Self> {
        let fields = parser::fields(line);
        if !(MIN_FIELD_COUNT..=MAX_FIELD_COUNT).contains(&fields.len()) {
            return None;
        }

        Some(Self {
            host: Pattern::parse(fields[0]),
            port: Pattern::parse(fields[1]),
            database: Pattern::parse(fields[2]),
            user: Pattern::parse(fields[3]),
            raw_password: fields.get(4).copied(),
        })
    }

    pub fn matches(&self, query: &PassfileQuery) -> bool {
        self.host.matches(&query.host)
            && self.port.matches(&query.port)
            && self.database.matches(&query.database)
            && self.user.matches(&query.user)
    }

    /// The unescaped password, if the entry has one.
    pub fn password(&self) -> Option<String> {
        self.raw_password.map(parser::unescape)
    }
}

impl fmt::Debug for Entry<'_> {
    // Hand-rolled to censor passwords
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field(
                "password",
                &self.raw_password.map(|_| "[ Censored ]"),
            )
            .finish()
    }
}
