//! Authentication extractors.
//!
//! Each extractor resolves the session's [`AuthState`] (see
//! [`crate::auth::SessionCache`]) before the handler runs. The resolved state
//! is stashed in the request extensions so several extractors on one handler
//! only confirm the user with the backend once.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use dompee_core::{Role, User};
use tower_sessions::Session;

use crate::auth::{AuthState, SessionCache};
use crate::error::set_sentry_user;
use crate::state::AppState;

/// Path visitors are sent to when a page needs a signed-in user.
pub const LOGIN_PATH: &str = "/login";

/// Error returned when a page's auth requirement is not met.
#[derive(Debug)]
pub enum AuthRejection {
    /// No session layer in front of the handler.
    MissingSession,
    /// Nobody is signed in.
    RedirectToLogin,
    /// Signed in with a role that may not see the page.
    WrongRole(Role),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession => {
                tracing::error!("Session layer missing");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::WrongRole(role) => Redirect::to(role.landing_path()).into_response(),
        }
    }
}

/// Extractor for the auth state of the current request, signed in or not.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentAuth(auth): CurrentAuth) -> impl IntoResponse {
///     match auth.user() {
///         Some(user) => format!("Hello, {}!", user.first_name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct CurrentAuth(pub AuthState);

impl FromRequestParts<AppState> for CurrentAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<AuthState>() {
            return Ok(Self(resolved.clone()));
        }

        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSession)?;

        let auth = SessionCache::new(&session, state.config().auth_reverify)
            .resolve(state.backend())
            .await;

        if let Some(user) = auth.user() {
            set_sentry_user(&user.userid, Some(&user.email));
        }

        parts.extensions.insert(auth.clone());
        Ok(Self(auth))
    }
}

/// Extractor that requires a signed-in user of any role.
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentAuth(auth) = CurrentAuth::from_request_parts(parts, state).await?;
        auth.into_user()
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that requires a signed-in admin. Other roles are sent to their
/// own landing page.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if user.is_admin() {
            Ok(Self(user))
        } else {
            Err(AuthRejection::WrongRole(user.role))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    fn location(rejection: AuthRejection) -> Option<String> {
        rejection
            .into_response()
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    #[test]
    fn test_rejections_redirect_by_role() {
        assert_eq!(location(AuthRejection::RedirectToLogin).as_deref(), Some("/login"));
        assert_eq!(
            location(AuthRejection::WrongRole(Role::ShopOwner)).as_deref(),
            Some("/shops")
        );
        assert_eq!(location(AuthRejection::WrongRole(Role::User)).as_deref(), Some("/"));
    }

    #[test]
    fn test_missing_session_is_server_error() {
        assert_eq!(
            AuthRejection::MissingSession.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
