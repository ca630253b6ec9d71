use log::{debug, trace, warn};
use std::{
    env,
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
    process::Command,
};

use super::{Source, Stream};
use crate::{pgpass, pgpass::FilePermissions, service};

pub const APPDATA_ENVIRONMENT_VAR: &str = "APPDATA";
pub const PG_CONFIG: &str = "pg_config";

/// The directory per-user files are found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseDir {
    /// The user's home directory.
    Home,
    /// `%APPDATA%`.
    AppData,
}

/// The platform-specific parts of locating files: where per-user files live,
/// whether a sysconfdir can be discovered, and which permission model applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub base_dir: BaseDir,
    /// Path of the password file, relative to the base directory.
    pub passfile: &'static [&'static str],
    /// Path of the service file, relative to the base directory.
    pub service_file: &'static [&'static str],
    /// Ask `pg_config --sysconfdir` for the system configuration directory.
    pub discover_sysconfdir: bool,
    /// Files carry POSIX permission bits.
    pub posix_permissions: bool,
}

impl Platform {
    pub const UNIX: Self = Self {
        base_dir: BaseDir::Home,
        passfile: &[pgpass::FILENAME],
        service_file: &[service::FILENAME],
        discover_sysconfdir: true,
        posix_permissions: true,
    };
    pub const WINDOWS: Self = Self {
        base_dir: BaseDir::AppData,
        passfile: &[pgpass::DIRECTORY_WINDOWS, pgpass::FILENAME_WINDOWS],
        service_file: &[service::FILENAME],
        discover_sysconfdir: false,
        posix_permissions: false,
    };

    /// The profile of the platform we were compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::WINDOWS
        } else {
            Self::UNIX
        }
    }
}

/// A [`Source`] backed by the process environment and the file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSource {
    platform: Platform,
    base_dir: Option<PathBuf>,
}

impl SystemSource {
    pub fn new() -> Self {
        Self::with_platform(Platform::current())
    }

    pub fn with_platform(platform: Platform) -> Self {
        let base_dir = match platform.base_dir {
            BaseDir::Home => home::home_dir(),
            BaseDir::AppData => env::var_os(APPDATA_ENVIRONMENT_VAR).map(PathBuf::from),
        };
        if base_dir.is_none() {
            warn!("Failed to find {:?} directory", platform.base_dir);
        }
        Self { platform, base_dir }
    }

    /// Look for per-user files in `dir` instead of the platform's default.
    pub fn with_base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn in_base_dir(&self, components: &[&str]) -> Option<PathBuf> {
        let mut path = self.base_dir.clone()?;
        path.extend(components);
        Some(path)
    }
}

impl Default for SystemSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for SystemSource {
    fn var(&self, name: &str) -> Option<String> {
        match env::var(name) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => {
                warn!("Ignoring environment variable {}: not valid unicode", name);
                None
            }
        }
    }

    fn user_service_file(&self) -> Option<PathBuf> {
        self.in_base_dir(self.platform.service_file)
    }

    fn user_passfile(&self) -> Option<PathBuf> {
        self.in_base_dir(self.platform.passfile)
    }

    fn discover_sysconfdir(&self) -> Option<PathBuf> {
        if !self.platform.discover_sysconfdir {
            return None;
        }
        let output = match Command::new(PG_CONFIG).arg("--sysconfdir").output() {
            Ok(output) => output,
            Err(e) => {
                debug!("Could not run {}: {}", PG_CONFIG, e);
                return None;
            }
        };
        if !output.status.success() {
            debug!("{} --sysconfdir failed ({})", PG_CONFIG, output.status);
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let sysconfdir = stdout.lines().next().filter(|line| !line.is_empty())?;
        trace!("{} reported sysconfdir {}", PG_CONFIG, sysconfdir);
        Some(PathBuf::from(sysconfdir))
    }

    fn system_user(&self) -> Option<String> {
        match whoami::fallible::username() {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Failed to determine the system user: {}", e);
                None
            }
        }
    }

    fn open(&self, path: &Path) -> io::Result<Stream<'_>> {
        let f = File::open(path)?;
        Ok(Box::new(BufReader::new(f)))
    }

    fn permissions(&self, path: &Path) -> io::Result<FilePermissions> {
        let metadata = fs::metadata(path)?;
        if self.platform.posix_permissions {
            Ok(posix_permissions(&metadata))
        } else {
            Ok(FilePermissions::Unsupported)
        }
    }
}

#[cfg(unix)]
fn posix_permissions(metadata: &fs::Metadata) -> FilePermissions {
    use std::os::unix::fs::PermissionsExt;
    FilePermissions::Posix(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn posix_permissions(_metadata: &fs::Metadata) -> FilePermissions {
    FilePermissions::Unsupported
}
