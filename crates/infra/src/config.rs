//! Configuration loading and representation.
//!
//! Everything is read from environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `PANTRY_STORE` | `memory` | `memory` or `postgres` |
//! | `DATABASE_URL` | none | required when `PANTRY_STORE=postgres` |
//! | `PANTRY_COLLECTION` | `inventory` | collection holding the records |
//! | `PANTRY_WRITE_STRATEGY` | `atomic` | `atomic` or `read-modify-write` |
//! | `PANTRY_BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |

use std::net::SocketAddr;

use thiserror::Error;

use crate::ledger::{DEFAULT_COLLECTION, WriteStrategy};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: unsupported value '{value}' (expected one of: {expected})")]
    Unsupported {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}: invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which document store backs the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres { database_url: String },
}

impl StoreBackend {
    /// Short label, safe to log (never includes the connection string).
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::InMemory => "memory",
            StoreBackend::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PantryConfig {
    pub store: StoreBackend,
    pub collection: String,
    pub write_strategy: WriteStrategy,
    pub bind_addr: SocketAddr,
}

impl PantryConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup` (variable name → value).
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let store = match get("PANTRY_STORE").as_deref() {
            None | Some("memory") => StoreBackend::InMemory,
            Some("postgres") => StoreBackend::Postgres {
                database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some(other) => {
                return Err(ConfigError::Unsupported {
                    var: "PANTRY_STORE",
                    value: other.to_string(),
                    expected: "memory, postgres",
                });
            }
        };

        let write_strategy = match get("PANTRY_WRITE_STRATEGY").as_deref() {
            None | Some("atomic") => WriteStrategy::PreferAtomic,
            Some("read-modify-write") => WriteStrategy::ReadModifyWrite,
            Some(other) => {
                return Err(ConfigError::Unsupported {
                    var: "PANTRY_WRITE_STRATEGY",
                    value: other.to_string(),
                    expected: "atomic, read-modify-write",
                });
            }
        };

        let collection = get("PANTRY_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let raw_addr = get("PANTRY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "PANTRY_BIND_ADDR",
            value: raw_addr.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            store,
            collection,
            write_strategy,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<PantryConfig, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PantryConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults_to_in_memory_atomic() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.store, StoreBackend::InMemory);
        assert_eq!(cfg.collection, "inventory");
        assert_eq!(cfg.write_strategy, WriteStrategy::PreferAtomic);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(
            config(&[("PANTRY_STORE", "postgres")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );

        let cfg = config(&[
            ("PANTRY_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/pantry"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/pantry".to_string()
            }
        );
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(matches!(
            config(&[("PANTRY_STORE", "firestore")]),
            Err(ConfigError::Unsupported { var: "PANTRY_STORE", .. })
        ));
        assert!(matches!(
            config(&[("PANTRY_WRITE_STRATEGY", "yolo")]),
            Err(ConfigError::Unsupported { var: "PANTRY_WRITE_STRATEGY", .. })
        ));
        assert!(matches!(
            config(&[("PANTRY_BIND_ADDR", "not an addr")]),
            Err(ConfigError::Invalid { var: "PANTRY_BIND_ADDR", .. })
        ));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("PANTRY_COLLECTION", "  "), ("PANTRY_WRITE_STRATEGY", "")]).unwrap();
        assert_eq!(cfg.collection, "inventory");
        assert_eq!(cfg.write_strategy, WriteStrategy::PreferAtomic);
    }

    #[test]
    fn overrides_are_honored() {
        let cfg = config(&[
            ("PANTRY_COLLECTION", "pantry"),
            ("PANTRY_WRITE_STRATEGY", "read-modify-write"),
            ("PANTRY_BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(cfg.collection, "pantry");
        assert_eq!(cfg.write_strategy, WriteStrategy::ReadModifyWrite);
        assert_eq!(cfg.bind_addr.port(), 9000);
    }
}
