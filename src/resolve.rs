//! Assemble connection parameters the way libpq does.
//!
//! Values are taken from, in order of priority:
//!
//! 1. the initial values supplied by the caller,
//! 2. the section of a [service file](crate::service) named by the `service`
//!    parameter or `PGSERVICE`,
//! 3. `PG*` environment variables,
//! 4. the login name of the invoking user, for `user`,
//! 5. a [password file](crate::pgpass), for `password`.
//!
//! A parameter set by a source is never overwritten by a later one. Missing,
//! unreadable or invalid files are logged and skipped; resolution itself
//! never fails.

use log::{debug, trace, warn};
use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    parameter::{Parameter, Parameters},
    pgpass::{self, PassfileQuery},
    service::{self, ServiceFileError},
    source::{Source, Stream},
    Conninfo,
};

/// Resolve `initial` against everything `source` knows about.
///
/// ```
/// # use pg_conninfo::{resolve, source::MemorySource, Parameter, Parameters};
/// let source = MemorySource::default()
///     .with_var("PGHOST", "db.example.com")
///     .with_var("PGUSER", "bob")
///     .with_user_passfile("/home/alice/.pgpass", "db.example.com:*:*:alice:secret\n");
/// let initial = Parameters::from([
///     (Parameter::User, "alice".to_string()),
///     (Parameter::Dbname, "appdb".to_string()),
/// ]);
/// let conninfo = resolve(initial, &source);
/// assert_eq!(conninfo.get(Parameter::Host), Some("db.example.com"));
/// assert_eq!(conninfo.get(Parameter::User), Some("alice"));
/// assert_eq!(conninfo.get(Parameter::Password), Some("secret"));
/// ```
pub fn resolve<S: Source + ?Sized>(initial: Parameters, source: &S) -> Conninfo {
    let mut params = initial;
    apply_service(&mut params, source);
    apply_environment(&mut params, source);
    apply_system_user(&mut params, source);
    apply_passfile(&mut params, source);
    Conninfo::from(params)
}

/// Collects initial values before running [`resolve`].
///
/// ```
/// # use pg_conninfo::{source::MemorySource, Parameter, Resolver};
/// let source = MemorySource::default().with_var("PGPORT", "6543");
/// let conninfo = Resolver::new(&source)
///     .with(Parameter::Host, "db.example.com")
///     .with_keywords([("dbname", "appdb"), ("not_a_keyword", "ignored")])
///     .resolve();
/// assert_eq!(
///     conninfo.to_string(),
///     "dbname=appdb host=db.example.com port=6543"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Resolver<'a, S: ?Sized> {
    source: &'a S,
    initial: Parameters,
}

impl<'a, S: Source + ?Sized> Resolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            initial: Parameters::new(),
        }
    }

    /// Supply an initial value, replacing any earlier one for `parameter`.
    pub fn with<V: ToString>(mut self, parameter: Parameter, value: V) -> Self {
        self.initial.insert(parameter, value.to_string());
        self
    }

    /// Supply initial values by libpq keyword. Unknown keywords are ignored.
    pub fn with_keywords<I, K, V>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        for (keyword, value) in keywords {
            match Parameter::from_keyword(keyword.as_ref()) {
                Some(parameter) => {
                    self.initial.insert(parameter, value.to_string());
                }
                None => debug!("Ignoring unknown keyword '{}'", keyword.as_ref()),
            }
        }
        self
    }

    pub fn resolve(self) -> Conninfo {
        resolve(self.initial, self.source)
    }
}

fn value(params: &Parameters, parameter: Parameter) -> Option<&str> {
    params.get(&parameter).map(String::as_str)
}

/// Copy every value of `other` which `params` does not have yet.
fn merge(params: &mut Parameters, other: Parameters) {
    for (parameter, value) in other {
        params.entry(parameter).or_insert(value);
    }
}

fn apply_service<S: Source + ?Sized>(params: &mut Parameters, source: &S) {
    let name = match params.get(&Parameter::Service) {
        Some(name) => name.clone(),
        None => match source.var(service::NAME_ENVIRONMENT_VAR) {
            Some(name) => name,
            None => return,
        },
    };

    let definition = find_service_definition(source, &name);
    params.entry(Parameter::Service).or_insert(name);
    if let Some(definition) = definition {
        merge(params, definition);
    }
}

fn find_service_definition<S: Source + ?Sized>(source: &S, name: &str) -> Option<Parameters> {
    // An explicit service file is the only one consulted.
    if let Some(path) = source.var(service::PATH_ENVIRONMENT_VAR) {
        return read_service(source, name, Path::new(&path));
    }

    match source.user_service_file() {
        Some(path) => {
            if let Some(definition) = read_service(source, name, &path) {
                return Some(definition);
            }
        }
        None => debug!("No per-user service file location"),
    }

    let sysconfdir = match source.var(service::SYSCONFDIR_ENVIRONMENT_VAR) {
        Some(dir) => PathBuf::from(dir),
        None => source.discover_sysconfdir()?,
    };
    read_service(source, name, &sysconfdir.join(service::SYSCONFDIR_FILENAME))
}

fn read_service<S: Source + ?Sized>(source: &S, name: &str, path: &Path) -> Option<Parameters> {
    let reader = open(source, path, "service file")?;
    match service::find_service(name, reader) {
        Ok(Some(definition)) => {
            trace!("Found service '{}' in {}", name, path.display());
            Some(definition)
        }
        Ok(None) => {
            debug!("No service '{}' in {}", name, path.display());
            None
        }
        Err(ServiceFileError::Malformed(e)) => {
            warn!("{}, file {}, line {}", e.kind(), path.display(), e.line_number());
            None
        }
        Err(ServiceFileError::Io(e)) => {
            warn!("Failed to parse service file {}: {}", path.display(), e);
            None
        }
    }
}

fn apply_environment<S: Source + ?Sized>(params: &mut Parameters, source: &S) {
    for parameter in Parameter::ALL {
        let Some(var) = parameter.env_var() else {
            continue;
        };
        if params.contains_key(&parameter) {
            continue;
        }
        if let Some(value) = source.var(var) {
            params.insert(parameter, value);
        }
    }
}

fn apply_system_user<S: Source + ?Sized>(params: &mut Parameters, source: &S) {
    if params.contains_key(&Parameter::User) {
        return;
    }
    if let Some(user) = source.system_user() {
        params.insert(Parameter::User, user);
    }
}

fn apply_passfile<S: Source + ?Sized>(params: &mut Parameters, source: &S) {
    if params.contains_key(&Parameter::Password) {
        return;
    }
    let Some(query) = PassfileQuery::new(
        value(params, Parameter::Host),
        value(params, Parameter::Port),
        value(params, Parameter::Dbname),
        value(params, Parameter::User),
    ) else {
        trace!("Not consulting a password file without both dbname and user");
        return;
    };
    let Some(reader) = open_passfile(source) else {
        return;
    };
    if let Some(password) = query.find_password(reader) {
        params.insert(Parameter::Password, password);
    }
}

/// The password file named by `PGPASSFILE`, opened as-is, otherwise the
/// per-user password file if its permissions are strict enough.
fn open_passfile<'s, S: Source + ?Sized>(source: &'s S) -> Option<Stream<'s>> {
    // A set variable is the only file consulted, even when it is empty.
    if let Some(path) = source.var(pgpass::PATH_ENVIRONMENT_VAR) {
        return open(source, Path::new(&path), "password file");
    }

    let Some(path) = source.user_passfile() else {
        debug!("No per-user {} location", pgpass::FILENAME);
        return None;
    };
    match source.permissions(&path) {
        Ok(permissions) if permissions.is_trustworthy() => {}
        Ok(_) => {
            warn!(
                "password file \"{}\" has group or world access; permissions should be u=rw (0600) or less",
                path.display()
            );
            return None;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No password file at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!(
                "Could not check permissions of password file {}: {}",
                path.display(),
                e
            );
            return None;
        }
    }
    open(source, &path, "password file")
}

fn open<'s, S: Source + ?Sized>(source: &'s S, path: &Path, what: &str) -> Option<Stream<'s>> {
    match source.open(path) {
        Ok(reader) => Some(reader),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No {} at {}", what, path.display());
            None
        }
        Err(e) => {
            warn!("Failed to open {} {}: {}", what, path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pgpass::FilePermissions, source::MemorySource};

    const ENV_SERVICE_FILE: &str = "[some-service]\n\
                                    dbname=env-service-file-dbname\n\
                                    port=env-service-file-port\n";
    const USER_SERVICE_FILE: &str = "[some-service]\n\
                                     dbname=user-service-file-dbname\n\
                                     port=user-service-file-port\n";
    const ENV_SYSCONFDIR_SERVICE_FILE: &str = "[some-service]\n\
                                               dbname=env-sysconfdir-service-file-dbname\n\
                                               port=env-sysconfdir-service-file-port\n\
                                               host=env-sysconfdir-service-file-host\n";
    const CONFIG_SYSCONFDIR_SERVICE_FILE: &str = "[some-service]\n\
                                                  dbname=config-sysconfdir-service-file-dbname\n\
                                                  port=config-sysconfdir-service-file-port\n\
                                                  host=config-sysconfdir-service-file-host\n\
                                                  user=config-sysconfdir-service-file-user\n";

    const USER_SERVICE_PATH: &str = "/home/alice/.pg_service.conf";
    const USER_PASSFILE_PATH: &str = "/home/alice/.pgpass";

    fn params<const N: usize>(values: [(Parameter, &str); N]) -> Parameters {
        values
            .into_iter()
            .map(|(p, v)| (p, v.to_string()))
            .collect()
    }

    fn props() -> Parameters {
        params([
            (Parameter::Host, "props-host"),
            (Parameter::Port, "props-port"),
            (Parameter::Dbname, "props-dbname"),
            (Parameter::User, "props-user"),
        ])
    }

    /// Every service file location populated; which one is used depends on
    /// the environment.
    fn service_files(source: MemorySource) -> MemorySource {
        source
            .with_file("/env/service.conf", ENV_SERVICE_FILE)
            .with_user_service_file(USER_SERVICE_PATH, USER_SERVICE_FILE)
            .with_file("/env-sysconfdir/pg_service.conf", ENV_SYSCONFDIR_SERVICE_FILE)
            .with_sysconfdir("/config-sysconfdir")
            .with_file(
                "/config-sysconfdir/pg_service.conf",
                CONFIG_SYSCONFDIR_SERVICE_FILE,
            )
    }

    fn passfiles(source: MemorySource, env: &str, user: &str) -> MemorySource {
        source
            .with_file("/env/passfile", env)
            .with_user_passfile(USER_PASSFILE_PATH, user)
    }

    #[test]
    fn all_environment_variables() {
        let mut source = MemorySource::default();
        let mut expected = Parameters::new();
        for parameter in Parameter::ALL {
            if let Some(var) = parameter.env_var() {
                let value = format!("env-{}", parameter.keyword());
                source = source.with_var(var, &value);
                expected.insert(parameter, value);
            }
        }

        let conninfo = resolve(Parameters::new(), &source);
        assert_eq!(conninfo, Conninfo::from(expected));
    }

    #[test]
    fn initial_values_only() {
        let conninfo = resolve(props(), &MemorySource::default());
        assert_eq!(conninfo, Conninfo::from(props()));
    }

    #[test]
    fn env_service_file_never_falls_back() {
        let source = service_files(MemorySource::default())
            .with_var("PGSERVICE", "some-service")
            .with_var("PGSERVICEFILE", "/env/service.conf");
        let expected = params([
            (Parameter::Service, "some-service"),
            (Parameter::Port, "env-service-file-port"),
            (Parameter::Dbname, "env-service-file-dbname"),
        ]);
        assert_eq!(resolve(Parameters::new(), &source), Conninfo::from(expected));

        let source = service_files(MemorySource::default())
            .with_var("PGSERVICE", "some-service")
            .with_var("PGSERVICEFILE", "/env/missing.conf");
        let expected = params([(Parameter::Service, "some-service")]);
        assert_eq!(resolve(Parameters::new(), &source), Conninfo::from(expected));
    }

    #[test]
    fn user_service_file() {
        let source = service_files(MemorySource::default()).with_var("PGSERVICE", "some-service");
        let expected = params([
            (Parameter::Service, "some-service"),
            (Parameter::Port, "user-service-file-port"),
            (Parameter::Dbname, "user-service-file-dbname"),
        ]);
        assert_eq!(resolve(Parameters::new(), &source), Conninfo::from(expected));
    }

    #[test]
    fn env_sysconfdir_service_file() {
        let source = MemorySource::default()
            .with_var("PGSERVICE", "some-service")
            .with_var("PGSYSCONFDIR", "/env-sysconfdir")
            .with_file("/env-sysconfdir/pg_service.conf", ENV_SYSCONFDIR_SERVICE_FILE)
            .with_sysconfdir("/config-sysconfdir")
            .with_file(
                "/config-sysconfdir/pg_service.conf",
                CONFIG_SYSCONFDIR_SERVICE_FILE,
            );
        let expected = params([
            (Parameter::Service, "some-service"),
            (Parameter::Host, "env-sysconfdir-service-file-host"),
            (Parameter::Port, "env-sysconfdir-service-file-port"),
            (Parameter::Dbname, "env-sysconfdir-service-file-dbname"),
        ]);
        assert_eq!(resolve(Parameters::new(), &source), Conninfo::from(expected));
    }

    #[test]
    fn discovered_sysconfdir_service_file() {
        let source = MemorySource::default()
            .with_var("PGSERVICE", "some-service")
            .with_file("/env-sysconfdir/pg_service.conf", ENV_SYSCONFDIR_SERVICE_FILE)
            .with_sysconfdir("/config-sysconfdir")
            .with_file(
                "/config-sysconfdir/pg_service.conf",
                CONFIG_SYSCONFDIR_SERVICE_FILE,
            );
        let expected = params([
            (Parameter::Service, "some-service"),
            (Parameter::Host, "config-sysconfdir-service-file-host"),
            (Parameter::Port, "config-sysconfdir-service-file-port"),
            (Parameter::Dbname, "config-sysconfdir-service-file-dbname"),
            (Parameter::User, "config-sysconfdir-service-file-user"),
        ]);
        assert_eq!(resolve(Parameters::new(), &source), Conninfo::from(expected));
    }

    #[test]
    fn service_missing_from_user_file_falls_through() {
        let source = MemorySource::default()
            .with_var("PGSERVICE", "some-service")
            .with_var("PGSYSCONFDIR", "/env-sysconfdir")
            .with_user_service_file(USER_SERVICE_PATH, "[another-service]\ndbname=nope\n")
            .with_file("/env-sysconfdir/pg_service.conf", ENV_SYSCONFDIR_SERVICE_FILE);
        let conninfo = resolve(Parameters::new(), &source);
        assert_eq!(
            conninfo.get(Parameter::Dbname),
            Some("env-sysconfdir-service-file-dbname")
        );
    }

    #[test]
    fn malformed_user_service_file_falls_through() {
        let source = MemorySource::default()
            .with_var("PGSERVICE", "some-service")
            .with_var("PGSYSCONFDIR", "/env-sysconfdir")
            .with_user_service_file(
                USER_SERVICE_PATH,
                "[some-service]\ndbname=user\nbad_port=6543\n",
            )
            .with_file("/env-sysconfdir/pg_service.conf", ENV_SYSCONFDIR_SERVICE_FILE);
        let conninfo = resolve(Parameters::new(), &source);
        assert_eq!(
            conninfo.get(Parameter::Dbname),
            Some("env-sysconfdir-service-file-dbname")
        );
        assert_eq!(
            conninfo.get(Parameter::Host),
            Some("env-sysconfdir-service-file-host")
        );
    }

    #[test]
    fn service_name_from_initial_values() {
        let source = service_files(MemorySource::default()).with_var("PGSERVICE", "ignored");
        let initial = params([(Parameter::Service, "some-service")]);
        let conninfo = resolve(initial, &source);
        assert_eq!(conninfo.get(Parameter::Service), Some("some-service"));
        assert_eq!(conninfo.get(Parameter::Dbname), Some("user-service-file-dbname"));
    }

    #[test]
    fn unknown_service_is_still_recorded() {
        let source = service_files(MemorySource::default()).with_var("PGSERVICE", "nowhere");
        let expected = params([(Parameter::Service, "nowhere")]);
        assert_eq!(resolve(Parameters::new(), &source), Conninfo::from(expected));
    }

    #[test]
    fn env_passfile() {
        let source = passfiles(
            MemorySource::default().with_var("PGPASSFILE", "/env/passfile"),
            "*:*:*:*:env-password",
            "*:*:*:*:user-password",
        );
        let mut expected = props();
        expected.insert(Parameter::Password, "env-password".to_string());
        expected.insert(Parameter::Passfile, "/env/passfile".to_string());
        assert_eq!(resolve(props(), &source), Conninfo::from(expected));
    }

    #[test]
    fn env_passfile_skips_the_permission_check() {
        let source = passfiles(
            MemorySource::default().with_var("PGPASSFILE", "/env/passfile"),
            "*:*:*:*:env-password",
            "*:*:*:*:user-password",
        )
        .with_permissions("/env/passfile", FilePermissions::Posix(0o644));
        let conninfo = resolve(props(), &source);
        assert_eq!(conninfo.get(Parameter::Password), Some("env-password"));
    }

    #[test]
    fn missing_env_passfile_does_not_fall_back() {
        let source = MemorySource::default()
            .with_var("PGPASSFILE", "/env/missing")
            .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:user-password");
        let conninfo = resolve(props(), &source);
        assert_eq!(conninfo.get(Parameter::Password), None);
    }

    #[test]
    fn empty_env_passfile_does_not_fall_back() {
        let source = MemorySource::default()
            .with_var("PGPASSFILE", "")
            .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:user-password");
        let conninfo = resolve(props(), &source);
        assert_eq!(conninfo.get(Parameter::Password), None);
        assert_eq!(conninfo.get(Parameter::Passfile), Some(""));
    }

    #[test]
    fn passfile_parameter_does_not_replace_user_passfile() {
        let source = MemorySource::default()
            .with_file("/caller/passfile", "*:*:*:*:caller-password")
            .with_permissions("/caller/passfile", FilePermissions::Posix(0o644))
            .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:user-password");
        let mut initial = props();
        initial.insert(Parameter::Passfile, "/caller/passfile".to_string());

        let conninfo = resolve(initial, &source);
        assert_eq!(conninfo.get(Parameter::Password), Some("user-password"));
        assert_eq!(conninfo.get(Parameter::Passfile), Some("/caller/passfile"));
    }

    #[test]
    fn unreadable_permissions_are_not_trusted() {
        for kind in [io::ErrorKind::PermissionDenied, io::ErrorKind::Other] {
            let source = MemorySource::default()
                .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:user-password")
                .with_permission_error(USER_PASSFILE_PATH, kind);
            let conninfo = resolve(props(), &source);
            assert_eq!(conninfo.get(Parameter::Password), None, "{:?}", kind);
        }
    }

    #[test]
    fn user_passfile() {
        let source = passfiles(
            MemorySource::default(),
            "*:*:*:*:env-password",
            "*:*:*:*:user-password",
        );
        let mut expected = props();
        expected.insert(Parameter::Password, "user-password".to_string());
        assert_eq!(resolve(props(), &source), Conninfo::from(expected));
    }

    #[test]
    fn system_user_and_user_passfile() {
        let source = passfiles(
            MemorySource::default().with_system_user("system-user"),
            "*:*:*:system-user:system-user-env-password\n*:*:*:*:env-password",
            "*:*:*:system-user:system-user-user-password\n*:*:*:*:user-password",
        );
        let initial = params([
            (Parameter::Host, "props-host"),
            (Parameter::Port, "props-port"),
            (Parameter::Dbname, "props-dbname"),
        ]);
        let expected = params([
            (Parameter::Host, "props-host"),
            (Parameter::Port, "props-port"),
            (Parameter::Dbname, "props-dbname"),
            (Parameter::User, "system-user"),
            (Parameter::Password, "system-user-user-password"),
        ]);
        assert_eq!(resolve(initial, &source), Conninfo::from(expected));
    }

    #[test]
    fn system_user_and_env_passfile() {
        let source = passfiles(
            MemorySource::default()
                .with_system_user("system-user")
                .with_var("PGPASSFILE", "/env/passfile"),
            "*:*:*:system-user:system-user-env-password\n*:*:*:*:env-password",
            "*:*:*:system-user:system-user-user-password\n*:*:*:*:user-password",
        );
        let initial = params([
            (Parameter::Host, "props-host"),
            (Parameter::Port, "props-port"),
            (Parameter::Dbname, "props-dbname"),
        ]);
        let expected = params([
            (Parameter::Host, "props-host"),
            (Parameter::Port, "props-port"),
            (Parameter::Dbname, "props-dbname"),
            (Parameter::User, "system-user"),
            (Parameter::Password, "system-user-env-password"),
            (Parameter::Passfile, "/env/passfile"),
        ]);
        assert_eq!(resolve(initial, &source), Conninfo::from(expected));
    }

    #[test]
    fn loose_user_passfile_is_ignored() {
        for mode in [0o644, 0o640, 0o604, 0o700, 0o200] {
            let source = MemorySource::default()
                .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:user-password")
                .with_permissions(USER_PASSFILE_PATH, FilePermissions::Posix(mode));
            let conninfo = resolve(props(), &source);
            assert_eq!(conninfo.get(Parameter::Password), None, "{:o}", mode);
        }
    }

    #[test]
    fn strict_user_passfile_is_used() {
        for mode in [0o400, 0o600, 0o100600] {
            let source = MemorySource::default()
                .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:user-password")
                .with_permissions(USER_PASSFILE_PATH, FilePermissions::Posix(mode));
            let conninfo = resolve(props(), &source);
            assert_eq!(
                conninfo.get(Parameter::Password),
                Some("user-password"),
                "{:o}",
                mode
            );
        }
    }

    #[test]
    fn unsupported_permissions_are_trusted() {
        let source = MemorySource::default()
            .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:user-password")
            .with_permissions(USER_PASSFILE_PATH, FilePermissions::Unsupported);
        let conninfo = resolve(props(), &source);
        assert_eq!(conninfo.get(Parameter::Password), Some("user-password"));
    }

    #[test]
    fn passfile_needs_dbname_and_user() {
        let source = MemorySource::default().with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:pw");
        let initial = params([(Parameter::User, "alice")]);
        assert_eq!(resolve(initial, &source).get(Parameter::Password), None);

        let initial = params([(Parameter::User, "alice"), (Parameter::Dbname, "")]);
        assert_eq!(resolve(initial, &source).get(Parameter::Password), None);
    }

    #[test]
    fn passfile_uses_resolved_values() {
        let source = MemorySource::default()
            .with_var("PGSERVICE", "svc")
            .with_user_service_file(USER_SERVICE_PATH, "[svc]\nhost=db\nport=6543\n")
            .with_var("PGDATABASE", "appdb")
            .with_system_user("alice")
            .with_user_passfile(
                USER_PASSFILE_PATH,
                "db:5432:appdb:alice:wrong-port\ndb:6543:appdb:alice:right\n",
            );
        let conninfo = resolve(Parameters::new(), &source);
        assert_eq!(conninfo.get(Parameter::Password), Some("right"));
    }

    #[test]
    fn password_is_not_looked_up_when_present() {
        let source = MemorySource::default()
            .with_var("PGPASSWORD", "from-env")
            .with_user_passfile(USER_PASSFILE_PATH, "*:*:*:*:from-file");
        assert_eq!(resolve(props(), &source).get(Parameter::Password), Some("from-env"));
    }

    #[test]
    fn precedence() {
        let source = MemorySource::default()
            .with_var("PGSERVICE", "svc")
            .with_user_service_file(
                USER_SERVICE_PATH,
                "[svc]\nhost=service-host\nport=service-port\ndbname=service-dbname\n",
            )
            .with_var("PGHOST", "env-host")
            .with_var("PGPORT", "env-port")
            .with_var("PGUSER", "env-user")
            .with_var("PGAPPNAME", "env-app")
            .with_system_user("system-user");
        let initial = params([(Parameter::Host, "initial-host")]);

        let conninfo = resolve(initial, &source);
        assert_eq!(conninfo.get(Parameter::Host), Some("initial-host"));
        assert_eq!(conninfo.get(Parameter::Port), Some("service-port"));
        assert_eq!(conninfo.get(Parameter::Dbname), Some("service-dbname"));
        assert_eq!(conninfo.get(Parameter::User), Some("env-user"));
        assert_eq!(conninfo.get(Parameter::ApplicationName), Some("env-app"));
    }

    #[test]
    fn empty_environment_variables_are_values() {
        let source = MemorySource::default()
            .with_var("PGUSER", "")
            .with_system_user("system-user");
        let conninfo = resolve(Parameters::new(), &source);
        assert_eq!(conninfo.get(Parameter::User), Some(""));
    }

    #[test]
    fn idempotent() {
        let source = service_files(passfiles(
            MemorySource::default()
                .with_var("PGSERVICE", "some-service")
                .with_var("PGHOST", "env-host")
                .with_system_user("system-user"),
            "",
            "*:*:*:*:user-password",
        ));
        let first = resolve(Parameters::new(), &source);
        let second = resolve(Parameters::new(), &source);
        assert_eq!(first, second);
    }

    #[test]
    fn service_example() {
        let source = MemorySource::default()
            .with_var("PGSERVICE", "svc1")
            .with_user_service_file(USER_SERVICE_PATH, "[svc1]\ndbname=appdb\nhost=dbhost\n");
        let initial = params([(Parameter::User, "alice")]);
        let expected = params([
            (Parameter::User, "alice"),
            (Parameter::Service, "svc1"),
            (Parameter::Dbname, "appdb"),
            (Parameter::Host, "dbhost"),
        ]);
        let conninfo = resolve(initial, &source);
        assert_eq!(conninfo, Conninfo::from(expected));
        assert_eq!(conninfo.get(Parameter::Password), None);
    }

    #[test]
    fn resolver_builder() {
        let source = MemorySource::default().with_var("PGUSER", "env-user");
        let conninfo = Resolver::new(&source)
            .with(Parameter::Dbname, "first")
            .with(Parameter::Dbname, "appdb")
            .with_keywords([("host", "db"), ("bogus", "x"), ("HOST", "y")])
            .resolve();
        let expected = params([
            (Parameter::Dbname, "appdb"),
            (Parameter::Host, "db"),
            (Parameter::User, "env-user"),
        ]);
        assert_eq!(conninfo, Conninfo::from(expected));
    }

    #[test]
    fn resolver_accepts_trait_objects() {
        let source = MemorySource::default().with_var("PGHOST", "db");
        let source: &dyn Source = &source;
        assert_eq!(Resolver::new(source).resolve().get(Parameter::Host), Some("db"));
    }
}
