//! Deciding whether a password file may be trusted.
//!
//! libpq refuses to read a password file which grants any access to the group
//! or to other users. Only the POSIX access bits are considered; on platforms
//! without them the file is trusted, as it lives in a directory private to the
//! user.

use serde::{Deserialize, Serialize};

pub const OWNER_READ: u32 = 0o400;
pub const OWNER_WRITE: u32 = 0o200;
/// The user/group/other access bits. Anything above (file type, setuid, ...)
/// is ignored.
pub const ACCESS_MASK: u32 = 0o777;

/// The permission model a file is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilePermissions {
    /// POSIX mode bits, as returned by `stat`.
    Posix(u32),
    /// The platform has no owner/group/other model.
    Unsupported,
}

impl FilePermissions {
    /// Whether a password file with these permissions may be read.
    pub fn is_trustworthy(self) -> bool {
        match self {
            FilePermissions::Posix(mode) => is_trustworthy(mode),
            FilePermissions::Unsupported => true,
        }
    }
}

/// Returns true iff the mode is exactly `u=r` or `u=rw`.
pub fn is_trustworthy(mode: u32) -> bool {
    let access = mode & ACCESS_MASK;
    access & OWNER_READ != 0 && access & !(OWNER_READ | OWNER_WRITE) == 0
}
