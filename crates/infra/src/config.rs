//! Configuration loading and representation.
//!
//! Everything comes from the process environment:
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `CALENDAR_BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `CALENDAR_STORE` | `memory` | `memory` or `postgres` |
//! | `DATABASE_URL` | (none) | required when `CALENDAR_STORE=postgres` |
//! | `DATABASE_MAX_CONNECTIONS` | `5` | Postgres pool size |

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which event store backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup (tests inject a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("CALENDAR_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "CALENDAR_BIND_ADDR",
            message: e.to_string(),
        })?;

        let kind = lookup("CALENDAR_STORE").unwrap_or_else(|| "memory".to_string());
        let store = match kind.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => StoreConfig::InMemory,
            "postgres" => {
                let database_url = lookup("DATABASE_URL")
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                    Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        message: e.to_string(),
                    })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                StoreConfig::Postgres {
                    database_url,
                    max_connections,
                }
            }
            other => {
                return Err(ConfigError::Invalid {
                    var: "CALENDAR_STORE",
                    message: format!("expected 'memory' or 'postgres', got '{other}'"),
                });
            }
        };

        Ok(Self { bind_addr, store })
    }
}
