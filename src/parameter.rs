//! The closed set of connection parameters understood by libpq.
//! <https://www.postgresql.org/docs/current/libpq-connect.html#LIBPQ-PARAMKEYWORDS>

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;

/// A mapping from [`Parameter`] to value. Iteration follows the declaration
/// order of [`Parameter`].
pub type Parameters = BTreeMap<Parameter, String>;

/// A connection parameter. Each parameter has a keyword (used in service files
/// and connection strings) and optionally an environment variable which
/// supplies a default.
///
/// Declaration order matches libpq's option table, and is the order used
/// whenever a set of parameters is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    ApplicationName,
    /// Obsolete, kept so that old service files still parse.
    Authtype,
    ChannelBinding,
    ClientEncoding,
    ConnectTimeout,
    Dbname,
    FallbackApplicationName,
    Gssencmode,
    Gsslib,
    Host,
    Hostaddr,
    Keepalives,
    KeepalivesCount,
    KeepalivesIdle,
    KeepalivesInterval,
    Krbsrvname,
    Options,
    /// Location of the password file. Not sent to the server.
    Passfile,
    Password,
    Port,
    Replication,
    Requirepeer,
    /// Name of a service file section. Not sent to the server.
    Service,
    Sslcert,
    Sslcompression,
    Sslcrl,
    Sslkey,
    Sslmode,
    Sslpassword,
    Sslrootcert,
    TargetSessionAttrs,
    TcpUserTimeout,
    /// Obsolete, kept so that old service files still parse.
    Tty,
    User,
}

impl Parameter {
    /// Every parameter, in declaration order.
    pub const ALL: [Parameter; 34] = [
        Parameter::ApplicationName,
        Parameter::Authtype,
        Parameter::ChannelBinding,
        Parameter::ClientEncoding,
        Parameter::ConnectTimeout,
        Parameter::Dbname,
        Parameter::FallbackApplicationName,
        Parameter::Gssencmode,
        Parameter::Gsslib,
        Parameter::Host,
        Parameter::Hostaddr,
        Parameter::Keepalives,
        Parameter::KeepalivesCount,
        Parameter::KeepalivesIdle,
        Parameter::KeepalivesInterval,
        Parameter::Krbsrvname,
        Parameter::Options,
        Parameter::Passfile,
        Parameter::Password,
        Parameter::Port,
        Parameter::Replication,
        Parameter::Requirepeer,
        Parameter::Service,
        Parameter::Sslcert,
        Parameter::Sslcompression,
        Parameter::Sslcrl,
        Parameter::Sslkey,
        Parameter::Sslmode,
        Parameter::Sslpassword,
        Parameter::Sslrootcert,
        Parameter::TargetSessionAttrs,
        Parameter::TcpUserTimeout,
        Parameter::Tty,
        Parameter::User,
    ];

    /// The keyword naming this parameter in service files and connection strings.
    pub const fn keyword(self) -> &'static str {
        match self {
            Parameter::ApplicationName => "application_name",
            Parameter::Authtype => "authtype",
            Parameter::ChannelBinding => "channel_binding",
            Parameter::ClientEncoding => "client_encoding",
            Parameter::ConnectTimeout => "connect_timeout",
            Parameter::Dbname => "dbname",
            Parameter::FallbackApplicationName => "fallback_application_name",
            Parameter::Gssencmode => "gssencmode",
            Parameter::Gsslib => "gsslib",
            Parameter::Host => "host",
            Parameter::Hostaddr => "hostaddr",
            Parameter::Keepalives => "keepalives",
            Parameter::KeepalivesCount => "keepalives_count",
            Parameter::KeepalivesIdle => "keepalives_idle",
            Parameter::KeepalivesInterval => "keepalives_interval",
            Parameter::Krbsrvname => "krbsrvname",
            Parameter::Options => "options",
            Parameter::Passfile => "passfile",
            Parameter::Password => "password",
            Parameter::Port => "port",
            Parameter::Replication => "replication",
            Parameter::Requirepeer => "requirepeer",
            Parameter::Service => "service",
            Parameter::Sslcert => "sslcert",
            Parameter::Sslcompression => "sslcompression",
            Parameter::Sslcrl => "sslcrl",
            Parameter::Sslkey => "sslkey",
            Parameter::Sslmode => "sslmode",
            Parameter::Sslpassword => "sslpassword",
            Parameter::Sslrootcert => "sslrootcert",
            Parameter::TargetSessionAttrs => "target_session_attrs",
            Parameter::TcpUserTimeout => "tcp_user_timeout",
            Parameter::Tty => "tty",
            Parameter::User => "user",
        }
    }

    /// The environment variable supplying a default for this parameter, if any.
    pub const fn env_var(self) -> Option<&'static str> {
        match self {
            Parameter::ApplicationName => Some("PGAPPNAME"),
            Parameter::Authtype => Some("PGAUTHTYPE"),
            Parameter::ChannelBinding => Some("PGCHANNELBINDING"),
            Parameter::ClientEncoding => Some("PGCLIENTENCODING"),
            Parameter::ConnectTimeout => Some("PGCONNECT_TIMEOUT"),
            Parameter::Dbname => Some("PGDATABASE"),
            Parameter::Gssencmode => Some("PGGSSENCMODE"),
            Parameter::Gsslib => Some("PGGSSLIB"),
            Parameter::Host => Some("PGHOST"),
            Parameter::Hostaddr => Some("PGHOSTADDR"),
            Parameter::Krbsrvname => Some("PGKRBSRVNAME"),
            Parameter::Options => Some("PGOPTIONS"),
            Parameter::Passfile => Some("PGPASSFILE"),
            Parameter::Password => Some("PGPASSWORD"),
            Parameter::Port => Some("PGPORT"),
            Parameter::Requirepeer => Some("PGREQUIREPEER"),
            Parameter::Service => Some("PGSERVICE"),
            Parameter::Sslcert => Some("PGSSLCERT"),
            Parameter::Sslcompression => Some("PGSSLCOMPRESSION"),
            Parameter::Sslcrl => Some("PGSSLCRL"),
            Parameter::Sslkey => Some("PGSSLKEY"),
            Parameter::Sslmode => Some("PGSSLMODE"),
            Parameter::Sslrootcert => Some("PGSSLROOTCERT"),
            Parameter::TargetSessionAttrs => Some("PGTARGETSESSIONATTRS"),
            Parameter::Tty => Some("PGTTY"),
            Parameter::User => Some("PGUSER"),
            Parameter::FallbackApplicationName
            | Parameter::Keepalives
            | Parameter::KeepalivesCount
            | Parameter::KeepalivesIdle
            | Parameter::KeepalivesInterval
            | Parameter::Replication
            | Parameter::Sslpassword
            | Parameter::TcpUserTimeout => None,
        }
    }

    /// Look up a parameter by keyword. Matching is exact and case-sensitive.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    /// Whether the value of this parameter must be masked before display.
    pub const fn is_secret(self) -> bool {
        matches!(self, Parameter::Password | Parameter::Sslpassword)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Parameter {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_keyword(s).ok_or_else(|| UnknownKeyword(s.to_string()))
    }
}

/// A keyword which does not name any [`Parameter`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized connection parameter keyword: '{0}'.")]
pub struct UnknownKeyword(pub String);
