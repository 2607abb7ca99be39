//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_URL` - Base URL of the spreadsheet script backend
//!
//! ## Optional
//! - `BACKEND_WRITE_ACK` - `assumed` (default) or `required`
//! - `BACKEND_WRITE_SETTLE_MS` - Delay before an assumed write is reported done (default: 1500)
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout for backend calls (default: none)
//! - `DOMPEE_HOST` - Bind address (default: 127.0.0.1)
//! - `DOMPEE_PORT` - Listen port (default: 3000)
//! - `DOMPEE_BASE_URL` - Public URL for the site (default: <http://localhost:3000>)
//! - `AUTH_REVERIFY_SECS` - Seconds a remote user confirmation stays fresh (default: 0)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::backend::WriteAck;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// How long a remote confirmation of the signed-in user stays fresh.
    /// Zero re-checks on every request.
    pub auth_reverify: Duration,
    /// Remote backend configuration
    pub backend: BackendConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (production, staging, ...)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Remote backend configuration.
///
/// Implements `Debug` manually to redact the script URL, which embeds the
/// deployment id.
#[derive(Clone)]
pub struct BackendConfig {
    /// Script deployment URL
    pub url: SecretString,
    /// How writes are acknowledged
    pub write_ack: WriteAck,
    /// Delay before an assumed write is reported as done
    pub write_settle: Duration,
    /// Optional per-request timeout
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &"[REDACTED]")
            .field("write_ack", &self.write_ack)
            .field("write_settle", &self.write_settle)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_parsed_or_default::<IpAddr>("DOMPEE_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("DOMPEE_PORT", "3000")?;
        let base_url = get_env_or_default("DOMPEE_BASE_URL", "http://localhost:3000");
        let auth_reverify =
            Duration::from_secs(get_parsed_or_default::<u64>("AUTH_REVERIFY_SECS", "0")?);

        Ok(Self {
            host,
            port,
            base_url,
            auth_reverify,
            backend: BackendConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Load the backend settings alone (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `BACKEND_URL` is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let url = get_required_env("BACKEND_URL")?;
        url::Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string()))?;

        let write_ack = get_parsed_or_default::<WriteAck>("BACKEND_WRITE_ACK", "assumed")?;
        let settle_ms = get_parsed_or_default::<u64>("BACKEND_WRITE_SETTLE_MS", "1500")?;
        let timeout = get_optional_env("BACKEND_TIMEOUT_SECS")
            .map(|v| parse_env::<u64>("BACKEND_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            url: SecretString::from(url),
            write_ack,
            write_settle: Duration::from_millis(settle_ms),
            timeout,
        })
    }

    /// Build a config pointing at `url` with default policies.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: SecretString::from(url.into()),
            write_ack: WriteAck::default(),
            write_settle: Duration::from_millis(1500),
            timeout: None,
        }
    }

    /// The script URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment value, naming the variable on failure.
fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get and parse an environment variable, falling back to `default`.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_env(key, &get_env_or_default(key, default))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> SiteConfig {
        SiteConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            auth_reverify: Duration::ZERO,
            backend: BackendConfig::with_url("https://script.google.com/macros/s/DEPLOYMENT/exec"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = "https://dompee.lk".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_parse_env_reports_variable() {
        let err = parse_env::<u16>("DOMPEE_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "DOMPEE_PORT"));
        assert_eq!(parse_env::<u64>("AUTH_REVERIFY_SECS", " 30 ").unwrap(), 30);
    }

    #[test]
    fn test_parse_write_ack() {
        assert_eq!(parse_env::<WriteAck>("X", "required").unwrap(), WriteAck::Required);
        assert_eq!(parse_env::<WriteAck>("X", "Assumed").unwrap(), WriteAck::Assumed);
        assert!(parse_env::<WriteAck>("X", "maybe").is_err());
    }

    #[test]
    fn test_backend_config_debug_redacts_url() {
        let backend = BackendConfig::with_url("https://script.google.com/macros/s/SECRET_ID/exec");
        let debug_output = format!("{backend:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("SECRET_ID"));
        assert_eq!(backend.url(), "https://script.google.com/macros/s/SECRET_ID/exec");
    }
}
