//! Environment-driven server configuration.
//!
//! | variable                              | default                 |
//! |---------------------------------------|-------------------------|
//! | `DATABASE_URL`                        | `sqlite://planneros.db` |
//! | `HOST`                                | `127.0.0.1`             |
//! | `PORT`                                | `3000`                  |
//! | `PLANNER_JWT_SECRET`                  | required                |
//! | `PLANNER_RATE_LIMIT_CAPACITY`         | `60` (at most 1e6)      |
//! | `PLANNER_RATE_LIMIT_REFILL_PER_SEC`   | `1.0` (1e-4..=1e6)      |
//! | `PLANNER_SQLITE_MAX_CONNECTIONS`      | `10` (clamped 1..=100)  |
//! | `PLANNER_CORS_PERMISSIVE`             | `false`                 |

use std::{net::SocketAddr, str::FromStr};

use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://planneros.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RATE_LIMIT_CAPACITY: f64 = 60.0;
pub const DEFAULT_RATE_LIMIT_REFILL_PER_SEC: f64 = 1.0;
pub const MAX_RATE_LIMIT_CAPACITY: f64 = 1_000_000.0;
pub const MIN_RATE_LIMIT_REFILL_PER_SEC: f64 = 0.0001;
pub const MAX_RATE_LIMIT_REFILL_PER_SEC: f64 = 1_000_000.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Burst size per key
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RATE_LIMIT_CAPACITY,
            refill_per_sec: DEFAULT_RATE_LIMIT_REFILL_PER_SEC,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub rate_limit: RateLimitConfig,
    pub sqlite_max_connections: u32,
    pub cors_permissive: bool,
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("PLANNER_JWT_SECRET")
            .map(SecretString::from)
            .ok_or(ConfigError::Missing("PLANNER_JWT_SECRET"))?;

        let capacity = parse_or(&get, "PLANNER_RATE_LIMIT_CAPACITY", DEFAULT_RATE_LIMIT_CAPACITY)?;
        let refill_per_sec = parse_or(
            &get,
            "PLANNER_RATE_LIMIT_REFILL_PER_SEC",
            DEFAULT_RATE_LIMIT_REFILL_PER_SEC,
        )?;
        for (key, value, in_range) in [
            (
                "PLANNER_RATE_LIMIT_CAPACITY",
                capacity,
                capacity > 0.0 && capacity <= MAX_RATE_LIMIT_CAPACITY,
            ),
            (
                "PLANNER_RATE_LIMIT_REFILL_PER_SEC",
                refill_per_sec,
                (MIN_RATE_LIMIT_REFILL_PER_SEC..=MAX_RATE_LIMIT_REFILL_PER_SEC)
                    .contains(&refill_per_sec),
            ),
        ] {
            // NaN fails both range checks.
            if !in_range {
                return Err(ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                });
            }
        }

        let sqlite_max_connections: u32 =
            parse_or(&get, "PLANNER_SQLITE_MAX_CONNECTIONS", db::DEFAULT_MAX_CONNECTIONS)?;

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            jwt_secret,
            rate_limit: RateLimitConfig {
                capacity,
                refill_per_sec,
            },
            sqlite_max_connections: sqlite_max_connections.clamp(1, 100),
            cors_permissive: parse_bool(&get, "PLANNER_CORS_PERMISSIVE")?,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            key: "HOST",
            value: self.host.clone(),
        })
    }

    pub fn db_config(&self) -> db::DbConfig {
        db::DbConfig::new(&self.database_url).with_max_connections(self.sqlite_max_connections)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &'static str) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v == "true" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "0" => Ok(false),
        Some(value) => Err(ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<PlannerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlannerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("PLANNER_JWT_SECRET", "shh")]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.jwt_secret.expose_secret(), "shh");
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.sqlite_max_connections, 10);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn test_secret_is_required() {
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::Missing("PLANNER_JWT_SECRET")
        );
        assert_eq!(
            config_from(&[("PLANNER_JWT_SECRET", "   ")]).unwrap_err(),
            ConfigError::Missing("PLANNER_JWT_SECRET")
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PLANNER_JWT_SECRET", "shh"),
            ("DATABASE_URL", "sqlite:///var/lib/planner.db"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("PLANNER_RATE_LIMIT_CAPACITY", "5"),
            ("PLANNER_RATE_LIMIT_REFILL_PER_SEC", "0.5"),
            ("PLANNER_CORS_PERMISSIVE", "TRUE"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit.capacity, 5.0);
        assert_eq!(config.rate_limit.refill_per_sec, 0.5);
        assert!(config.cors_permissive);
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("PLANNER_JWT_SECRET", "shh"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );

        assert!(
            config_from(&[
                ("PLANNER_JWT_SECRET", "shh"),
                ("PLANNER_RATE_LIMIT_CAPACITY", "0")
            ])
            .is_err()
        );
        assert!(
            config_from(&[("PLANNER_JWT_SECRET", "shh"), ("PLANNER_CORS_PERMISSIVE", "maybe")])
                .is_err()
        );
    }

    #[test]
    fn test_rate_limit_bounds() {
        for (key, value) in [
            ("PLANNER_RATE_LIMIT_CAPACITY", "1e30"),
            ("PLANNER_RATE_LIMIT_CAPACITY", "NaN"),
            ("PLANNER_RATE_LIMIT_CAPACITY", "inf"),
            ("PLANNER_RATE_LIMIT_REFILL_PER_SEC", "1e-300"),
            ("PLANNER_RATE_LIMIT_REFILL_PER_SEC", "-1"),
        ] {
            let err = config_from(&[("PLANNER_JWT_SECRET", "shh"), (key, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, .. } if k == key),
                "{key}={value} should be rejected"
            );
        }

        let config = config_from(&[
            ("PLANNER_JWT_SECRET", "shh"),
            ("PLANNER_RATE_LIMIT_CAPACITY", "1000000"),
            ("PLANNER_RATE_LIMIT_REFILL_PER_SEC", "0.0001"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit.capacity, MAX_RATE_LIMIT_CAPACITY);
    }

    #[test]
    fn test_max_connections_clamped() {
        let high = config_from(&[
            ("PLANNER_JWT_SECRET", "shh"),
            ("PLANNER_SQLITE_MAX_CONNECTIONS", "500"),
        ])
        .unwrap();
        assert_eq!(high.sqlite_max_connections, 100);

        let low = config_from(&[
            ("PLANNER_JWT_SECRET", "shh"),
            ("PLANNER_SQLITE_MAX_CONNECTIONS", "0"),
        ])
        .unwrap();
        assert_eq!(low.sqlite_max_connections, 1);
    }
}
