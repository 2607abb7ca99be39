//! CLI commands.
//!
//! # Environment Variables
//!
//! - `BACKEND_URL` - Base URL of the script backend
//! - `BACKEND_TIMEOUT_SECS` - Optional request timeout

pub mod shops;
pub mod users;

use dompee_site::backend::{BackendClient, BackendError};
use dompee_site::config::{BackendConfig, ConfigError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Build a backend client from the environment.
///
/// # Errors
///
/// Returns an error if `BACKEND_URL` is missing or invalid.
pub fn client() -> Result<BackendClient, CliError> {
    let config = BackendConfig::from_env()?;
    Ok(BackendClient::new(&config)?)
}

/// Cut `value` to at most `width` characters, marking the cut with `~`.
pub(crate) fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit() {
        assert_eq!(fit("Perera", 10), "Perera");
        assert_eq!(fit("Perera Stores", 6), "Perer~");
        assert_eq!(fit("ශ්‍රී ලංකා", 3).chars().count(), 3);
    }
}
