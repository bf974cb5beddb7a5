//! Project settings

use std::env::{self, VarError};
use std::path::PathBuf;

use thiserror::Error;

use crate::runserver::{AddrPortError, DefaultAddrport, RunserverOn};

/// Environment variable holding the default `host:port`
pub const RUNSERVER_ON_VAR: &str = "RUNSERVER_ON";

/// Environment variable overriding the hosts file location
pub const HOSTFILE_PATH_VAR: &str = "HOSTFILE_PATH";

/// Represents an error in reading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `RUNSERVER_ON` is set but is not a `host:port` value
    #[error("invalid RUNSERVER_ON: {0}")]
    RunserverOn(#[from] AddrPortError),
    /// A variable is set but is not valid unicode
    #[error("{0} is not valid unicode")]
    NotUnicode(&'static str),
}

/// Settings of the project being served
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Settings {
    /// Address the development server should serve on by default
    pub runserver_on: Option<RunserverOn>,
    /// Hosts file to inspect instead of the system one
    pub hosts_path: Option<PathBuf>,
}

impl Settings {
    /// Reads settings from `RUNSERVER_ON` and `HOSTFILE_PATH`.
    ///
    /// Unset variables leave the matching field `None`.
    pub fn from_env() -> Result<Settings, ConfigError> {
        Settings::from_vars(
            var(RUNSERVER_ON_VAR)?.as_deref(),
            var(HOSTFILE_PATH_VAR)?.as_deref(),
        )
    }

    /// Builds settings from raw values, as found in the environment.
    pub fn from_vars(
        runserver_on: Option<&str>,
        hosts_path: Option<&str>,
    ) -> Result<Settings, ConfigError> {
        let runserver_on = match runserver_on {
            Some(s) => Some(s.parse()?),
            None => None,
        };

        Ok(Settings {
            runserver_on,
            hosts_path: hosts_path.map(PathBuf::from),
        })
    }
}

impl DefaultAddrport for Settings {
    fn default_addrport(&self) -> Option<String> {
        self.runserver_on.default_addrport()
    }
}

fn var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name)),
    }
}

#[cfg(test)]
mod test {
    use super::{ConfigError, Settings};
    use crate::runserver::{DefaultAddrport, RunserverOn};
    use std::path::Path;

    #[test]
    fn test_from_vars() {
        let s = Settings::from_vars(Some("testproject.localhost:8000"), Some("/tmp/hosts")).unwrap();

        assert_eq!(
            s.runserver_on,
            Some(RunserverOn {
                host: "testproject.localhost".to_owned(),
                port: 8000,
            })
        );
        assert_eq!(s.hosts_path.as_deref(), Some(Path::new("/tmp/hosts")));
        assert_eq!(s.default_addrport().as_deref(), Some("testproject.localhost:8000"));
    }

    #[test]
    fn test_unset() {
        let s = Settings::from_vars(None, None).unwrap();

        assert_eq!(s, Settings::default());
        assert_eq!(s.default_addrport(), None);
    }

    #[test]
    fn test_invalid_runserver_on() {
        match Settings::from_vars(Some("no-port"), None) {
            Err(ConfigError::RunserverOn(_)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }
}
