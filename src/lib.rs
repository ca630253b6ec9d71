#![deny(unused_must_use)]
//! Resolve Postgres connection parameters the way libpq does.
//!
//! A client rarely receives every connection parameter directly. libpq fills
//! the gaps from a [connection service file](service), from `PG*` environment
//! variables, from the login name of the invoking user, and finally from a
//! [password file](pgpass). This crate performs the same resolution without
//! linking libpq, so that programs using other drivers honor the same
//! configuration as `psql`.
//!
//! ```no_run
//! # use pg_conninfo::{source::SystemSource, Parameter, Resolver};
//! # fn main() -> Result<(), postgres::Error> {
//! let source = SystemSource::new();
//! let conninfo = Resolver::new(&source)
//!     .with(Parameter::Dbname, "appdb")
//!     .resolve();
//! println!("Connecting with {}", conninfo); // Passwords are masked
//! let config = postgres::Config::try_from(&conninfo)?;
//! let client = config.connect(postgres::NoTls)?;
//! # Ok(())
//! # }
//! ```
//!
//! The main functionality is documented in [`resolve()`].

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod parameter;
pub mod pgpass;
pub mod resolve;
pub mod service;
pub mod source;

pub use parameter::{Parameter, Parameters, UnknownKeyword};
pub use resolve::{resolve, Resolver};
pub use source::Source;

pub const DEFAULT_PORT: u16 = 5432;

/// A fully resolved set of connection parameters.
///
/// Values are kept exactly as they were found; nothing is validated. The
/// values of [secret](Parameter::is_secret) parameters are masked when
/// formatted with `Debug` or `Display`, but returned unchanged by
/// [`get`](Conninfo::get).
///
/// ```
/// # use pg_conninfo::{Conninfo, Parameter, Parameters};
/// let conninfo = Conninfo::from(Parameters::from([
///     (Parameter::User, "alice".to_string()),
///     (Parameter::Password, "super-secret".to_string()),
/// ]));
/// assert_eq!(conninfo.to_string(), "password=**** user=alice");
/// assert_eq!(conninfo.get(Parameter::Password), Some("super-secret"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conninfo(Parameters);

impl Conninfo {
    /// Replaces the value of secret parameters when formatting.
    pub const MASK: &'static str = "****";

    pub fn get(&self, parameter: Parameter) -> Option<&str> {
        self.0.get(&parameter).map(String::as_str)
    }

    /// The set parameters and their values, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &str)> {
        self.0.iter().map(|(p, v)| (*p, v.as_str()))
    }

    /// Like [`iter`](Conninfo::iter), with secrets replaced by [`MASK`](Conninfo::MASK).
    pub fn redacted(&self) -> impl Iterator<Item = (Parameter, &str)> {
        self.iter()
            .map(|(p, v)| (p, if p.is_secret() { Self::MASK } else { v }))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_parameters(self) -> Parameters {
        self.0
    }

    /// Render the parameters `postgres` understands as a keyword/value
    /// connection string. Values are always quoted.
    fn postgres_connection_string(&self) -> String {
        let mut output = String::new();
        for (parameter, value) in self.iter() {
            let keyword = match parameter {
                Parameter::FallbackApplicationName
                    if self.0.contains_key(&Parameter::ApplicationName) =>
                {
                    continue
                }
                Parameter::FallbackApplicationName => Parameter::ApplicationName.keyword(),
                Parameter::KeepalivesCount => "keepalives_retries",
                Parameter::ApplicationName
                | Parameter::ChannelBinding
                | Parameter::ConnectTimeout
                | Parameter::Dbname
                | Parameter::Host
                | Parameter::Hostaddr
                | Parameter::Keepalives
                | Parameter::KeepalivesIdle
                | Parameter::KeepalivesInterval
                | Parameter::Options
                | Parameter::Password
                | Parameter::Port
                | Parameter::Sslmode
                | Parameter::TargetSessionAttrs
                | Parameter::TcpUserTimeout
                | Parameter::User => parameter.keyword(),
                _ => {
                    debug!("postgres does not support '{}', skipping it", parameter);
                    continue;
                }
            };
            if !output.is_empty() {
                output.push(' ');
            }
            output.push_str(keyword);
            output.push_str("='");
            quote_into(value, &mut output);
            output.push('\'');
        }
        output
    }
}

/// Escape a value for use inside single quotes in a connection string.
fn quote_into(s: &str, output: &mut String) {
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            output.push('\\');
        }
        output.push(c);
    }
}

impl From<Parameters> for Conninfo {
    fn from(value: Parameters) -> Self {
        Self(value)
    }
}

impl fmt::Display for Conninfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (parameter, value)) in self.redacted().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", parameter, value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Conninfo {
    // Hand-rolled to censor passwords
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Conninfo");
        for (parameter, value) in self.redacted() {
            s.field(parameter.keyword(), &value);
        }
        s.finish()
    }
}

/// Parameters without a `postgres` counterpart, such as `sslrootcert` or
/// `service`, are left out. Values are validated by `postgres`.
impl TryFrom<&Conninfo> for postgres::Config {
    type Error = postgres::Error;

    fn try_from(value: &Conninfo) -> Result<Self, Self::Error> {
        value.postgres_connection_string().parse()
    }
}
