//! User accounts as stored by the remote backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::lenient;
use super::role::Role;

/// Minimum length for a new password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A directory account.
///
/// The wire shape is camelCase (`firstName`, `lastName`) as produced by the
/// backend. Deserialization goes through a lenient intermediate so numeric
/// cells, missing columns and unknown roles do not reject the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireUser")]
pub struct User {
    /// Backend row id. Falls back to the email when the sheet has none.
    #[serde(rename = "userid")]
    pub userid: String,
    pub first_name: String,
    pub last_name: String,
    /// Identity key.
    pub email: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
}

impl User {
    /// Full display name, skipping empty parts.
    #[must_use]
    pub fn full_name(&self) -> String {
        [self.first_name.as_str(), self.last_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true if this user has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    #[serde(default, rename = "userid", alias = "userId", deserialize_with = "lenient::text")]
    userid: String,
    #[serde(default, alias = "first_name", deserialize_with = "lenient::text")]
    first_name: String,
    #[serde(default, alias = "last_name", deserialize_with = "lenient::text")]
    last_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    email: String,
    #[serde(default, deserialize_with = "lenient::text")]
    phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    address: String,
    #[serde(default)]
    role: Role,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        let email = wire.email.to_lowercase();
        let userid = if wire.userid.is_empty() {
            email.clone()
        } else {
            wire.userid
        };
        Self {
            userid,
            first_name: wire.first_name,
            last_name: wire.last_name,
            email,
            phone: wire.phone,
            address: wire.address,
            role: wire.role,
        }
    }
}

/// Reasons a new password is refused before it is sent anywhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Confirmation does not match.
    #[error("passwords do not match")]
    Mismatch,
    /// Shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
}

/// Validate a new password and its confirmation.
///
/// # Errors
///
/// Returns [`PasswordError::Mismatch`] when the two differ, or
/// [`PasswordError::TooShort`] when the password is too short.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), PasswordError> {
    if password != confirm {
        return Err(PasswordError::Mismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}
