use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use super::{Source, Stream};
use crate::pgpass::FilePermissions;

/// A [`Source`] which keeps environment variables and files in memory.
///
/// ```
/// # use pg_conninfo::{source::MemorySource, resolve, Parameter, Parameters};
/// let source = MemorySource::default()
///     .with_var("PGSERVICE", "svc1")
///     .with_user_service_file("/home/alice/.pg_service.conf", "[svc1]\ndbname=appdb\n")
///     .with_system_user("alice");
/// let conninfo = resolve(Parameters::new(), &source);
/// assert_eq!(conninfo.get(Parameter::Dbname), Some("appdb"));
/// assert_eq!(conninfo.get(Parameter::User), Some("alice"));
/// ```
///
/// Files are readable with mode `0600` unless
/// [`with_permissions`][MemorySource::with_permissions] says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    vars: BTreeMap<String, String>,
    files: BTreeMap<PathBuf, String>,
    permissions: BTreeMap<PathBuf, FilePermissions>,
    permission_errors: BTreeMap<PathBuf, io::ErrorKind>,
    user_service_file: Option<PathBuf>,
    user_passfile: Option<PathBuf>,
    sysconfdir: Option<PathBuf>,
    system_user: Option<String>,
}

impl MemorySource {
    pub const DEFAULT_PERMISSIONS: FilePermissions = FilePermissions::Posix(0o600);

    /// Set an environment variable.
    pub fn with_var<K: ToString, V: ToString>(mut self, name: K, value: V) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Add a file.
    pub fn with_file<P: Into<PathBuf>, T: ToString>(mut self, path: P, contents: T) -> Self {
        self.files.insert(path.into(), contents.to_string());
        self
    }

    /// Override the permissions reported for a path.
    pub fn with_permissions<P: Into<PathBuf>>(mut self, path: P, permissions: FilePermissions) -> Self {
        self.permissions.insert(path.into(), permissions);
        self
    }

    /// Make reading the permissions of a path fail with `kind`.
    pub fn with_permission_error<P: Into<PathBuf>>(mut self, path: P, kind: io::ErrorKind) -> Self {
        self.permission_errors.insert(path.into(), kind);
        self
    }

    /// Add a file and make it the per-user service file.
    pub fn with_user_service_file<P: Into<PathBuf>, T: ToString>(self, path: P, contents: T) -> Self {
        let path = path.into();
        let mut source = self.with_file(path.clone(), contents);
        source.user_service_file = Some(path);
        source
    }

    /// Add a file and make it the per-user password file.
    pub fn with_user_passfile<P: Into<PathBuf>, T: ToString>(self, path: P, contents: T) -> Self {
        let path = path.into();
        let mut source = self.with_file(path.clone(), contents);
        source.user_passfile = Some(path);
        source
    }

    /// The directory reported by [`Source::discover_sysconfdir`].
    pub fn with_sysconfdir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.sysconfdir = Some(path.into());
        self
    }

    pub fn with_system_user<T: ToString>(mut self, user: T) -> Self {
        self.system_user = Some(user.to_string());
        self
    }

    fn contents(&self, path: &Path) -> io::Result<&str> {
        self.files.get(path).map(String::as_str).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })
    }
}

impl Source for MemorySource {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn user_service_file(&self) -> Option<PathBuf> {
        self.user_service_file.clone()
    }

    fn user_passfile(&self) -> Option<PathBuf> {
        self.user_passfile.clone()
    }

    fn discover_sysconfdir(&self) -> Option<PathBuf> {
        self.sysconfdir.clone()
    }

    fn system_user(&self) -> Option<String> {
        self.system_user.clone()
    }

    fn open(&self, path: &Path) -> io::Result<Stream<'_>> {
        let contents = self.contents(path)?;
        Ok(Box::new(contents.as_bytes()))
    }

    fn permissions(&self, path: &Path) -> io::Result<FilePermissions> {
        self.contents(path)?;
        if let Some(kind) = self.permission_errors.get(path) {
            return Err(io::Error::new(
                *kind,
                format!("cannot read permissions of {}", path.display()),
            ));
        }
        Ok(self
            .permissions
            .get(path)
            .copied()
            .unwrap_or(Self::DEFAULT_PERMISSIONS))
    }
}
