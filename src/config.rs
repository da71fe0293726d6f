//! Environment-derived process configuration.
//!
//! Read once at startup into immutable values that are handed to the
//! storage provider and the HTTP server.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_STORAGE: &str = "STORAGE";
pub const ENV_DB_USERNAME: &str = "DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_DATABASE: &str = "DB_DATABASE";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: &str = "8080";
const DEFAULT_STORAGE: &str = "mysql";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: &str = "3306";
const DEFAULT_DB_DATABASE: &str = "ubisoft";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be provided")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown storage '{0}', expected 'mysql' or 'memory'")]
    UnknownStorage(String),
}

/// Connection parameters of the MySQL store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    username: String,
    password: String,
    host: String,
    port: u16,
    database: String,
}

impl fmt::Debug for DatabaseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseOptions")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

impl DatabaseOptions {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            host: host.into(),
            port,
            database: database.into(),
        }
    }

    /// Checks every connection parameter is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            (ENV_DB_USERNAME, &self.username),
            (ENV_DB_PASSWORD, &self.password),
            (ENV_DB_HOST, &self.host),
            (ENV_DB_DATABASE, &self.database),
        ];
        if let Some((key, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Missing(*key));
        }
        if self.port == 0 {
            return Err(ConfigError::Missing(ENV_DB_PORT));
        }
        Ok(())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    MySql(DatabaseOptions),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    host: String,
    port: u16,
    storage: StorageKind,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = load(&lookup, ENV_HOST, DEFAULT_HOST);
        let port = parse::<u16>(ENV_PORT, &load(&lookup, ENV_PORT, DEFAULT_PORT))?;

        let storage = match load(&lookup, ENV_STORAGE, DEFAULT_STORAGE)
            .to_ascii_lowercase()
            .as_str()
        {
            "mysql" => {
                let options = DatabaseOptions::new(
                    lookup(ENV_DB_USERNAME).unwrap_or_default(),
                    lookup(ENV_DB_PASSWORD).unwrap_or_default(),
                    load(&lookup, ENV_DB_HOST, DEFAULT_DB_HOST),
                    parse::<u16>(ENV_DB_PORT, &load(&lookup, ENV_DB_PORT, DEFAULT_DB_PORT))?,
                    load(&lookup, ENV_DB_DATABASE, DEFAULT_DB_DATABASE),
                );
                options.validate()?;
                StorageKind::MySql(options)
            }
            "memory" => StorageKind::Memory,
            other => return Err(ConfigError::UnknownStorage(other.to_string())),
        };

        Ok(Self {
            host,
            port,
            storage,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn storage(&self) -> &StorageKind {
        &self.storage
    }
}

fn load<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|value| !value.trim().is_empty()) {
        Some(value) => value,
        None => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
