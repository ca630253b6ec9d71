//! Where connection parameters come from.
//!
//! The resolution logic only talks to the outside world through [`Source`].
//! [`SystemSource`] is backed by the real environment and file system;
//! [`MemorySource`] holds everything in memory, for tests and for callers that
//! want full control.

mod memory;
mod system;

use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
};

pub use self::memory::MemorySource;
pub use self::system::{BaseDir, Platform, SystemSource};
use crate::pgpass::FilePermissions;

/// A readable file.
pub type Stream<'a> = Box<dyn BufRead + 'a>;

/// Queries used while resolving connection parameters. None of them may have
/// side effects visible to the caller.
pub trait Source {
    /// The value of an environment variable, or `None` if it is unset.
    fn var(&self, name: &str) -> Option<String>;

    /// Location of the per-user service file (`~/.pg_service.conf`).
    fn user_service_file(&self) -> Option<PathBuf>;

    /// Location of the per-user password file (`~/.pgpass`).
    fn user_passfile(&self) -> Option<PathBuf>;

    /// Best-effort discovery of the system configuration directory compiled
    /// into libpq, used when `PGSYSCONFDIR` is unset.
    fn discover_sysconfdir(&self) -> Option<PathBuf>;

    /// Login name of the invoking user.
    fn system_user(&self) -> Option<String>;

    /// Open a file for reading.
    fn open(&self, path: &Path) -> io::Result<Stream<'_>>;

    /// The permissions of a file.
    fn permissions(&self, path: &Path) -> io::Result<FilePermissions>;
}
