//! Client for the spreadsheet script backend.
//!
//! Every shop and user record lives in a Google Sheet behind a single Apps
//! Script deployment. Reads are `GET ?action=...` calls; writes are either
//! `GET` actions with a `{status, message}` reply or JSON `POST`s.
//!
//! Some POST writes historically could not read the reply at all, so the
//! [`WriteAck`] policy decides whether those replies are trusted.

pub mod types;

use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use dompee_core::{NormalizeError, Shop, ShopDraft, User, normalize_shop, normalize_shops};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;
use url::Url;

pub use types::{ProfileUpdate, Registration, ShopPayload, StatusReply, UserUpdate};
use types::{ActionBody, ForEmail, ShopData};

use crate::config::BackendConfig;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure (DNS, TLS, connection, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status.
    #[error("Backend returned HTTP {status}")]
    Status { status: u16 },

    /// The reply was not the JSON we expected.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Shop data did not normalize.
    #[error("Malformed shop data: {0}")]
    Malformed(#[from] NormalizeError),

    /// The backend refused the action.
    #[error("{0}")]
    Rejected(String),

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// `BACKEND_URL` is not a valid URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl BackendError {
    /// Whether the failure is on the network side rather than a refusal.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::Parse(_))
    }
}

/// How write actions whose reply may be unreadable are acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteAck {
    /// The reply body is ignored; success is reported after the settle delay.
    #[default]
    Assumed,
    /// The reply must be `{status: "success"}`.
    Required,
}

impl FromStr for WriteAck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assumed" => Ok(Self::Assumed),
            "required" => Ok(Self::Required),
            other => Err(format!("expected `assumed` or `required`, got `{other}`")),
        }
    }
}

/// Backend actions and how each one travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetShops,
    GetShopById,
    CreateShop,
    UpdateShop,
    DeleteShop,
    GetUsers,
    GetUser,
    Login,
    RegisterUser,
    UpdateUser,
    UpdateProfile,
    UpdatePassword,
    DeleteUser,
}

impl Operation {
    /// Value of the `action` field, if the operation carries one.
    #[must_use]
    pub const fn action(self) -> Option<&'static str> {
        match self {
            Self::GetShops => Some("getShops"),
            Self::GetShopById => Some("getShopById"),
            Self::UpdateShop => Some("updateShop"),
            Self::DeleteShop => Some("deleteShop"),
            Self::GetUsers => Some("getUsers"),
            Self::GetUser => Some("getUser"),
            Self::Login => Some("login"),
            Self::UpdateUser => Some("updateUser"),
            Self::UpdateProfile => Some("updateProfile"),
            Self::UpdatePassword => Some("updatePassword"),
            Self::DeleteUser => Some("deleteUser"),
            Self::CreateShop | Self::RegisterUser => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateShop => f.write_str("createShop"),
            Self::RegisterUser => f.write_str("registerUser"),
            other => f.write_str(other.action().unwrap_or_default()),
        }
    }
}

/// Backend API client.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
    write_ack: WriteAck,
    write_settle: std::time::Duration,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(config.url())?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            write_ack: config.write_ack,
            write_settle: config.write_settle,
        })
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// Fetch and normalize every shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the reply is not a list of
    /// shop objects.
    #[instrument(skip(self))]
    pub async fn get_shops(&self) -> Result<Vec<Shop>, BackendError> {
        let value = self.get(Operation::GetShops, &[]).await?;
        normalize_shops(&value).map_err(|e| {
            tracing::error!(error = %e, "Backend returned malformed shop list");
            BackendError::Malformed(e)
        })
    }

    /// Fetch one shop by registration number.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the backend answers `{error}`.
    #[instrument(skip(self))]
    pub async fn get_shop(&self, id: &str) -> Result<Shop, BackendError> {
        let value = self.get(Operation::GetShopById, &[("id", id)]).await?;

        if let Some(error) = value.get("error") {
            let message = error.as_str().unwrap_or("shop not found").to_string();
            return Err(BackendError::NotFound(message));
        }

        let mut shop = normalize_shop(&value, 0)?;
        if shop.reg_no.is_empty() {
            shop.id = id.to_string();
        }
        Ok(shop)
    }

    /// Create a shop under `reg_no`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, or if writes require
    /// acknowledgement and the backend refuses.
    #[instrument(skip(self, draft))]
    pub async fn create_shop(&self, reg_no: &str, draft: &ShopDraft) -> Result<(), BackendError> {
        let payload = ShopPayload::new(reg_no, draft);
        let response = self.post(Operation::CreateShop, &payload).await?;
        self.acknowledge(Operation::CreateShop, response).await
    }

    /// Replace the editable fields of shop `reg_no`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] unless the backend replies success.
    #[instrument(skip(self, draft))]
    pub async fn update_shop(&self, reg_no: &str, draft: &ShopDraft) -> Result<(), BackendError> {
        let payload = ShopPayload::new(reg_no, draft);
        let body = ActionBody {
            action: "updateShop",
            body: &ShopData { data: &payload },
        };
        let response = self.post(Operation::UpdateShop, &body).await?;
        let value = Self::read_json(Operation::UpdateShop, response).await?;
        expect_success(&value, "Update failed. Please try again.")
    }

    /// Delete shop `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] unless the backend replies success.
    #[instrument(skip(self))]
    pub async fn delete_shop(&self, id: &str) -> Result<(), BackendError> {
        let value = self.get(Operation::DeleteShop, &[("id", id)]).await?;
        expect_success(&value, "Delete failed.")
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Fetch every account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the reply is not a user list.
    #[instrument(skip(self))]
    pub async fn get_users(&self) -> Result<Vec<User>, BackendError> {
        let value = self.get(Operation::GetUsers, &[]).await?;
        serde_json::from_value(value).map_err(|e| {
            tracing::error!(error = %e, "Backend returned malformed user list");
            BackendError::Parse(e.to_string())
        })
    }

    /// Look up one account. `Ok(None)` means the backend does not know it.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_user(&self, email: &str) -> Result<Option<User>, BackendError> {
        let value = self.get(Operation::GetUser, &[("email", email)]).await?;
        if !StatusReply::from_value(&value).is_success() {
            return Ok(None);
        }
        Ok(value
            .get("user")
            .filter(|user| user.is_object())
            .and_then(|user| serde_json::from_value(user.clone()).ok()))
    }

    /// Check credentials and return the account.
    ///
    /// The user record may come back at the top level of the reply or
    /// nested under `user`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, BackendError> {
        let value = self
            .get(
                Operation::Login,
                &[("email", email), ("password", password.expose_secret())],
            )
            .await?;

        let reply = StatusReply::from_value(&value);
        if !reply.is_success() {
            return Err(BackendError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| "Invalid email or password".to_string()),
            ));
        }

        let record = value
            .get("user")
            .filter(|user| user.is_object())
            .unwrap_or(&value);
        let mut user: User = serde_json::from_value(record.clone())
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        if user.email.is_empty() {
            user.email = email.trim().to_lowercase();
            if user.userid.is_empty() {
                user.userid.clone_from(&user.email);
            }
        }
        Ok(user)
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, or if writes require
    /// acknowledgement and the backend refuses.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register_user(&self, registration: &Registration) -> Result<(), BackendError> {
        let response = self.post(Operation::RegisterUser, registration).await?;
        self.acknowledge(Operation::RegisterUser, response).await
    }

    /// Admin edit of any account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, or if writes require
    /// acknowledgement and the backend refuses.
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, email: &str, update: &UserUpdate) -> Result<(), BackendError> {
        let body = ActionBody {
            action: "updateUser",
            body: &ForEmail {
                email,
                fields: update,
            },
        };
        let response = self.post(Operation::UpdateUser, &body).await?;
        self.acknowledge(Operation::UpdateUser, response).await
    }

    /// Self-service profile edit.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, or if writes require
    /// acknowledgement and the backend refuses.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        let body = ActionBody {
            action: "updateProfile",
            body: &ForEmail {
                email,
                fields: update,
            },
        };
        let response = self.post(Operation::UpdateProfile, &body).await?;
        self.acknowledge(Operation::UpdateProfile, response).await
    }

    /// Change a password. The backend checks `current`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] with the backend's message when the
    /// change is refused.
    #[instrument(skip(self, current, new))]
    pub async fn update_password(
        &self,
        email: &str,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), BackendError> {
        let value = self
            .get(
                Operation::UpdatePassword,
                &[
                    ("email", email),
                    ("currentPassword", current.expose_secret()),
                    ("newPassword", new.expose_secret()),
                ],
            )
            .await?;
        expect_success(
            &value,
            "Failed to update password. Please check your current password.",
        )
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] unless the backend replies success.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, email: &str) -> Result<(), BackendError> {
        let value = self.get(Operation::DeleteUser, &[("email", email)]).await?;
        expect_success(&value, "Delete failed.")
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn url_for(&self, operation: Operation, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(action) = operation.action() {
                query.append_pair("action", action);
            }
            query.extend_pairs(params);
        }
        url
    }

    async fn get(&self, operation: Operation, params: &[(&str, &str)]) -> Result<Value, BackendError> {
        let url = self.url_for(operation, params);
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!(%operation, error = %e, "Backend request failed");
            BackendError::Http(e)
        })?;
        Self::read_json(operation, response).await
    }

    async fn post(
        &self,
        operation: Operation,
        body: &impl Serialize,
    ) -> Result<reqwest::Response, BackendError> {
        self.client
            .post(self.base_url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%operation, error = %e, "Backend request failed");
                BackendError::Http(e)
            })
    }

    async fn read_json(
        operation: Operation,
        response: reqwest::Response,
    ) -> Result<Value, BackendError> {
        let status = response.status();
        if !status.is_success() {
            tracing::error!(%operation, status = status.as_u16(), "Backend returned error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::error!(%operation, error = %e, "Backend reply was not JSON");
            BackendError::Parse(e.to_string())
        })
    }

    /// Apply the write policy to a POST reply.
    async fn acknowledge(
        &self,
        operation: Operation,
        response: reqwest::Response,
    ) -> Result<(), BackendError> {
        match self.write_ack {
            WriteAck::Assumed => {
                drop(response);
                tokio::time::sleep(self.write_settle).await;
                tracing::debug!(%operation, "Write assumed successful");
                Ok(())
            }
            WriteAck::Required => {
                let value = Self::read_json(operation, response).await?;
                expect_success(&value, "The backend did not confirm the change.")
            }
        }
    }
}

/// Turn a `{status, message}` reply into a result.
fn expect_success(value: &Value, fallback: &str) -> Result<(), BackendError> {
    let reply = StatusReply::from_value(value);
    if reply.is_success() {
        Ok(())
    } else {
        let message = reply
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        tracing::warn!(%message, "Backend refused action");
        Err(BackendError::Rejected(message))
    }
}

/// A fresh registration number for a new shop: `DMP-<year>-<1000..=9999>`.
#[must_use]
pub fn next_registration_number() -> String {
    let year = chrono::Utc::now().year();
    let serial = rand::rng().random_range(1000..=9999);
    dompee_core::registration_number(year, serial)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client() -> BackendClient {
        BackendClient::new(&BackendConfig::with_url(
            "https://script.example/macros/s/abc/exec",
        ))
        .unwrap()
    }

    #[test]
    fn test_get_urls_carry_action_and_params() {
        let url = client().url_for(Operation::GetUser, &[("email", "a+b@example.com")]);
        assert_eq!(
            url.as_str(),
            "https://script.example/macros/s/abc/exec?action=getUser&email=a%2Bb%40example.com"
        );
    }

    #[test]
    fn test_unrouted_posts_have_no_action() {
        assert_eq!(Operation::CreateShop.action(), None);
        assert_eq!(Operation::RegisterUser.action(), None);
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::GetShops.to_string(), "getShops");
        assert_eq!(Operation::RegisterUser.to_string(), "registerUser");
        assert_eq!(Operation::UpdatePassword.action(), Some("updatePassword"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = BackendClient::new(&BackendConfig::with_url("not a url"));
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[test]
    fn test_expect_success() {
        assert!(expect_success(&json!({ "status": "success" }), "x").is_ok());

        let err = expect_success(&json!({ "status": "error", "message": "Wrong password" }), "x")
            .unwrap_err();
        assert_eq!(err.to_string(), "Wrong password");

        let err = expect_success(&json!({ "status": "error" }), "fallback").unwrap_err();
        assert_eq!(err.to_string(), "fallback");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_registration_number_shape() {
        let reg = next_registration_number();
        let parts: Vec<&str> = reg.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "DMP");
        assert_eq!(parts[1].parse::<i32>().unwrap(), chrono::Utc::now().year());
        let serial: u16 = parts[2].parse().unwrap();
        assert!((1000..=9999).contains(&serial));
    }
}
