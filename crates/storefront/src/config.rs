//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STORAGE_PATH` - Client storage file (default: .bw-store.json)
//! - `STOREFRONT_PAYMENT_DELAY_MS` - Simulated payment wait (default: 2000)
//! - `STOREFRONT_VERIFY_DELAY_MS` - Simulated verification wait (default: 1000)
//! - `STOREFRONT_VERIFY_TIMEOUT_MS` - Verification lookup bound (default: 5000)
//! - `STOREFRONT_SUBMIT_DELAY_MS` - Simulated return and pre-order
//!   confirmation wait (default: 1000)
//! - `BACKEND_URL` - Hosted backend base URL; enables the remote catalog and
//!   order verification
//! - `BACKEND_ANON_KEY` - Public API key for the hosted backend (required
//!   when `BACKEND_URL` is set)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// File holding the persisted cart and favorites
    pub storage_path: PathBuf,
    /// How long the simulated gateway takes to settle a payment
    pub payment_delay: Duration,
    /// Latency of the built-in verification table
    pub verify_delay: Duration,
    /// Upper bound on a single verification lookup
    pub verify_timeout: Duration,
    /// How long return and pre-order submissions take to confirm
    pub submit_delay: Duration,
    /// Hosted backend, if configured
    pub backend: Option<BackendConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Hosted backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://abc.supabase.co/`
    pub url: Url,
    /// Public (anon) API key
    pub anon_key: SecretString,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if
    /// `BACKEND_URL` is set without `BACKEND_ANON_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let storage_path =
            PathBuf::from(get_env_or_default("STOREFRONT_STORAGE_PATH", ".bw-store.json"));
        let payment_delay = get_millis("STOREFRONT_PAYMENT_DELAY_MS", 2000)?;
        let verify_delay = get_millis("STOREFRONT_VERIFY_DELAY_MS", 1000)?;
        let verify_timeout = get_millis("STOREFRONT_VERIFY_TIMEOUT_MS", 5000)?;
        let submit_delay = get_millis("STOREFRONT_SUBMIT_DELAY_MS", 1000)?;
        let backend = BackendConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            storage_path,
            payment_delay,
            verify_delay,
            verify_timeout,
            submit_delay,
            backend,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            storage_path: PathBuf::from(".bw-store.json"),
            payment_delay: Duration::from_millis(2000),
            verify_delay: Duration::from_millis(1000),
            verify_timeout: Duration::from_millis(5000),
            submit_delay: Duration::from_millis(1000),
            backend: None,
            sentry_dsn: None,
        }
    }
}

impl BackendConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = get_optional_env("BACKEND_URL") else {
            return Ok(None);
        };
        let url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string()))?;
        let anon_key = SecretString::from(get_required_env("BACKEND_ANON_KEY")?);
        Ok(Some(Self { url, anon_key }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a millisecond duration with a default.
fn get_millis(key: &str, default: u64) -> Result<Duration, ConfigError> {
    match get_optional_env(key) {
        Some(raw) => parse_value::<u64>(key, &raw).map(Duration::from_millis),
        None => Ok(Duration::from_millis(default)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_valid_port() {
        let port: u16 = parse_value("STOREFRONT_PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_value_invalid_port() {
        let result = parse_value::<u16>("STOREFRONT_PORT", "70000");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_PORT"
        ));
    }

    #[test]
    fn test_parse_value_invalid_host() {
        assert!(parse_value::<IpAddr>("STOREFRONT_HOST", "not-an-ip").is_err());
    }

    #[test]
    fn test_default_socket_addr() {
        let config = StorefrontConfig::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.payment_delay, Duration::from_secs(2));
        assert_eq!(config.verify_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_backend_config_debug_redacts_key() {
        let config = BackendConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            anon_key: SecretString::from("eyJhbGciOiJIUzI1NiJ9.super-private"),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-private"));
    }
}
