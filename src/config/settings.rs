//! Process settings read from the environment (and `.env` through dotenvy in the binary).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/workspace_registry";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Insert the sample users, workspaces and templates at startup.
    pub seed_sample_data: bool,
    /// Drop and re-create all tables at startup.
    pub reset_schema: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind.parse().map_err(|_| ConfigError::BindAddr(bind.clone()))?;
        let max_connections = parse_or("MAX_CONNECTIONS", lookup("MAX_CONNECTIONS"), 5u32)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_CONNECTIONS",
                value: "0".into(),
            });
        }
        let acquire_secs = parse_or("ACQUIRE_TIMEOUT_SECS", lookup("ACQUIRE_TIMEOUT_SECS"), 5u64)?;
        let seed_sample_data = parse_flag("SEED_SAMPLE_DATA", lookup("SEED_SAMPLE_DATA"))?;
        let reset_schema = parse_flag("RESET_SCHEMA", lookup("RESET_SCHEMA"))?;
        Ok(Settings {
            database_url,
            bind_addr,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_secs),
            seed_sample_data,
            reset_schema,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

fn parse_flag(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|s| s.trim().to_lowercase()) {
        None => Ok(false),
        Some(s) => match s.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: s }),
        },
    }
}
