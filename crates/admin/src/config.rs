//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_URL` - Hosted backend base URL (e.g., <https://abc.supabase.co>)
//! - `BACKEND_SERVICE_KEY` - Service-role API key (HIGH PRIVILEGE, bypasses row security)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_IMAGE_BUCKET` - Storage bucket for product images (default: product-images)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_IMAGE_BUCKET: &str = "product-images";

/// Bits per character a pasted service key must reach. Real keys are
/// base64url JWTs and sit well above this.
const MIN_KEY_ENTROPY: f64 = 3.3;

/// Fragments that only show up in copied sample values.
const SAMPLE_KEY_MARKERS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "placeholder",
    "example",
    "service-key",
    "service_key",
    "xxx",
    "todo",
    "<",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Hosted backend configuration
    pub backend: BackendConfig,
    /// Whether to emit JSON logs
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Hosted backend configuration.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted backend
    pub url: Url,
    /// Service-role API key
    pub service_key: SecretString,
    /// Storage bucket product images are uploaded to
    pub image_bucket: String,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("service_key", &"[REDACTED]")
            .field("image_bucket", &self.image_bucket)
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from the environment (and `.env`, when present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is missing or malformed, or if the
    /// service key looks like a pasted sample value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("ADMIN_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("ADMIN_PORT", "3001")?;

        let backend = BackendConfig::from_env()?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            backend,
            json_logs,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BackendConfig {
    /// Load the backend section on its own (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL or key is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let url = Url::parse(&get_required_env("BACKEND_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string()))?;
        Ok(Self {
            url,
            service_key: service_key("BACKEND_SERVICE_KEY")?,
            image_bucket: get_env_or_default("ADMIN_IMAGE_BUCKET", DEFAULT_IMAGE_BUCKET),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Read the service key and reject obvious sample values.
fn service_key(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    check_key_strength(key, value.trim())?;
    Ok(SecretString::from(value.trim().to_string()))
}

fn check_key_strength(key: &str, value: &str) -> Result<(), ConfigError> {
    let lower = value.to_ascii_lowercase();
    if let Some(marker) = SAMPLE_KEY_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("looks like a sample value (contains '{marker}')"),
        ));
    }

    let bits = bits_per_char(value);
    if bits < MIN_KEY_ENTROPY {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("only {bits:.2} bits/char, expected at least {MIN_KEY_ENTROPY:.1}"),
        ));
    }
    Ok(())
}

/// Shannon entropy over bytes.
#[allow(clippy::cast_precision_loss)]
fn bits_per_char(value: &str) -> f64 {
    let mut counts = [0usize; 256];
    for byte in value.bytes() {
        counts[usize::from(byte)] += 1;
    }
    let total = value.len() as f64;
    counts
        .iter()
        .filter(|&&n| n > 0)
        .map(|&n| {
            let share = n as f64 / total;
            -share * share.log2()
        })
        .sum()
}
