//! Service configuration from the environment

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be used
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Account service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TCP port to listen on
    pub port: u16,
    /// SQLite connection string
    pub database_url: String,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            database_url: "sqlite://sapa_umkm.db".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    /// Read `PORT`, `DATABASE_URL` (or `MONGO_URI`) and `BCRYPT_COST`
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_or(&lookup, "PORT", defaults.port)?;

        let database_url = match database_url(&lookup) {
            Some((key, url)) if !url.starts_with("sqlite:") => {
                return Err(ConfigError::Invalid {
                    key,
                    value: url,
                    reason: "expected an sqlite: connection string".to_string(),
                });
            }
            Some((_, url)) => url,
            None => {
                tracing::info!("DATABASE_URL not set, using default: {}", defaults.database_url);
                defaults.database_url
            }
        };

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }

        Ok(Self { port, database_url, bcrypt_cost })
    }
}

/// `DATABASE_URL`, else the legacy `MONGO_URI`, with the variable it came from
fn database_url<F>(lookup: &F) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        return Some(("DATABASE_URL", url));
    }
    let legacy = lookup("MONGO_URI")?;
    tracing::warn!("DATABASE_URL not set, using MONGO_URI");
    Some(("MONGO_URI", legacy))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid { key, reason: e.to_string(), value }),
        },
        None => {
            tracing::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
