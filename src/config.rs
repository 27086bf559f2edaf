//! Connection configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! overrides (the CLI feeds environment variables and flags in through
//! [`DbConfig::apply`]). No credentials are compiled in.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Host name, IP address, or a Unix socket directory (leading `/`)
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    password: Option<String>,
    /// Seconds to wait for the server before giving up
    pub connect_timeout: u64,
    /// Log every statement and its parameters before execution
    pub verbose: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "postgres".to_string(),
            user: "postgres".to_string(),
            password: None,
            connect_timeout: 10,
            verbose: false,
        }
    }
}

/// Values that replace file/default settings when present.
#[derive(Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub verbose: bool,
}

impl DbConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Never logged.
    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dbname) = overrides.dbname {
            self.dbname = dbname;
        }
        if let Some(user) = overrides.user {
            self.user = user;
        }
        if overrides.password.is_some() {
            self.password = overrides.password;
        }
        self.verbose |= overrides.verbose;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dbname.is_empty() {
            return Err(ConfigError::Invalid("database name is empty".to_string()));
        }
        if self.user.is_empty() {
            return Err(ConfigError::Invalid("user name is empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        Ok(())
    }

    pub(crate) fn to_pg_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(if self.host.is_empty() { "localhost" } else { &self.host })
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .connect_timeout(self.connect_timeout())
            .application_name(env!("CARGO_PKG_NAME"));
        if let Some(password) = self.password() {
            config.password(password);
        }
        config
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout", &self.connect_timeout)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}
