//! Configuration module for the lectern backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Token-bucket settings for the per-client rate limiter.
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterConfig {
    /// When false every request is admitted and nothing is tracked
    pub enabled: bool,
    /// Tokens added per second
    pub rps: f64,
    /// Bucket capacity
    pub burst: u32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rps: 2.0,
            burst: 4,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
    /// Deployment label reported by the health check
    pub env: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub limiter: LimiterConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr = parse_var(
            &lookup,
            "LECTERN_BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 4000)),
        )?;

        let db_path = lookup("LECTERN_DB_PATH")
            .unwrap_or_else(|| "./data/lectern.sqlite".to_string())
            .into();

        let db_max_connections = parse_var(&lookup, "LECTERN_DB_MAX_CONNECTIONS", 5)?;
        if db_max_connections == 0 {
            return Err("LECTERN_DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        let env = lookup("LECTERN_ENV").unwrap_or_else(|| "development".to_string());
        let log_level = lookup("LECTERN_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let defaults = LimiterConfig::default();
        let limiter = LimiterConfig {
            enabled: parse_var(&lookup, "LECTERN_LIMITER_ENABLED", defaults.enabled)?,
            rps: parse_var(&lookup, "LECTERN_LIMITER_RPS", defaults.rps)?,
            burst: parse_var(&lookup, "LECTERN_LIMITER_BURST", defaults.burst)?,
        };
        if limiter.rps.is_nan() || limiter.rps <= 0.0 {
            return Err("LECTERN_LIMITER_RPS must be greater than zero".to_string());
        }

        Ok(Self {
            bind_addr,
            db_path,
            db_max_connections,
            env,
            log_level,
            limiter,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {} value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}
