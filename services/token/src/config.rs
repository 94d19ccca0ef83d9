//! Centralized configuration for the token issuer.
//!
//! Loaded from environment variables (and `.env` if present) and validated at
//! startup. The listen port can additionally be overridden on the command line.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::IssuerError;
use crate::issuance::{IssuanceDefaults, DEFAULT_VALID_FOR, MAX_VALID_FOR};
use crate::keystore::file::DEFAULT_KEY_PATH;
use crate::keystore::DEFAULT_KEY_BITS;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse a format name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown names.
    pub fn parse(s: &str) -> Result<Self, IssuerError> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(IssuerError::config(format!("Invalid LOG_FORMAT: {s}"))),
        }
    }
}

/// Token issuer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout: Duration,

    // Key settings
    /// Path of the persisted private key
    pub key_path: PathBuf,
    /// Modulus size for generated keys
    pub key_bits: usize,

    // Issuance settings
    /// Token lifetime when the request does not specify one
    pub default_valid_for: i64,

    // Logging
    /// Log level filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, IssuerError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IssuerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;
        let shutdown_timeout = Duration::from_secs(parse_var(&lookup, "SHUTDOWN_TIMEOUT", 10)?);

        let key_path = lookup("KEY_PATH").map_or_else(|| PathBuf::from(DEFAULT_KEY_PATH), PathBuf::from);
        let key_bits = parse_var(&lookup, "KEY_BITS", DEFAULT_KEY_BITS)?;
        if key_bits < DEFAULT_KEY_BITS {
            return Err(IssuerError::config(format!(
                "KEY_BITS must be at least {DEFAULT_KEY_BITS}, got {key_bits}"
            )));
        }

        let default_valid_for = parse_var(&lookup, "DEFAULT_VALID_FOR", DEFAULT_VALID_FOR)?;
        if !(1..=MAX_VALID_FOR).contains(&default_valid_for) {
            return Err(IssuerError::config(format!(
                "DEFAULT_VALID_FOR must be between 1 and {MAX_VALID_FOR}, got {default_valid_for}"
            )));
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = LogFormat::parse(&lookup("LOG_FORMAT").unwrap_or_else(|| "text".to_string()))?;

        Ok(Self {
            host,
            port,
            shutdown_timeout,
            key_path,
            key_bits,
            default_valid_for,
            log_level,
            log_format,
        })
    }

    /// Override the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, IssuerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| IssuerError::config(format!("Invalid HOST {}: {e}", self.host)))
    }

    /// Request defaults derived from this configuration.
    #[must_use]
    pub const fn issuance_defaults(&self) -> IssuanceDefaults {
        IssuanceDefaults {
            valid_for: self.default_valid_for,
        }
    }
}

/// Parse a variable, falling back to `default` when unset.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, IssuerError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .parse()
            .map_err(|e| IssuerError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, IssuerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.key_path, PathBuf::from("private_key.pem"));
        assert_eq!(config.key_bits, 2048);
        assert_eq!(config.default_valid_for, 600);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("KEY_PATH", "/var/lib/issuer/key.pem"),
            ("DEFAULT_VALID_FOR", "300"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.key_path, PathBuf::from("/var/lib/issuer/key.pem"));
        assert_eq!(config.issuance_defaults().valid_for, 300);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.with_port(9000).port, 9000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("KEY_BITS", "1024")]).is_err());
        assert!(config_from(&[("DEFAULT_VALID_FOR", "7200")]).is_err());
        assert!(config_from(&[("DEFAULT_VALID_FOR", "0")]).is_err());
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(config_from(&[("HOST", "not a host")]).unwrap().socket_addr().is_err());
    }
}
