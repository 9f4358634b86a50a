use std::env;
use std::net::SocketAddr;
use thiserror::Error;

// Database path - persistent in production, overridable for tests
pub const DEFAULT_DB_PATH: &str = "/var/lib/docsign/docsign.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_PUBLIC_PATH: &str = "/";

/// Largest accepted request body; signatures travel inline as data URIs
pub const MAX_BODY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub db_path: String,
    pub public_origin: String,
    pub public_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            db_path: DEFAULT_DB_PATH.to_string(),
            public_origin: DEFAULT_PUBLIC_ORIGIN.to_string(),
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment
    ///
    /// * `DOCSIGN_BIND` - listen address, wins over `PORT`
    /// * `PORT` - listen port on all interfaces
    /// * `DOCSIGN_DB_PATH` - SQLite file
    /// * `DOCSIGN_PUBLIC_ORIGIN` / `DOCSIGN_PUBLIC_PATH` - address embedded in signing links
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match (lookup("DOCSIGN_BIND"), lookup("PORT")) {
            (Some(addr), _) => addr.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
                name: "DOCSIGN_BIND",
                value: addr,
            })?,
            (None, Some(port)) => {
                let port = port.parse::<u16>().map_err(|_| ConfigError::Invalid {
                    name: "PORT",
                    value: port,
                })?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => defaults.bind_addr,
        };

        Ok(Self {
            bind_addr,
            db_path: lookup("DOCSIGN_DB_PATH").unwrap_or(defaults.db_path),
            public_origin: lookup("DOCSIGN_PUBLIC_ORIGIN").unwrap_or(defaults.public_origin),
            public_path: lookup("DOCSIGN_PUBLIC_PATH").unwrap_or(defaults.public_path),
        })
    }
}
