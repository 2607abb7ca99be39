//! Authentication route handlers.
//!
//! Handles login, registration and logout against the script backend. The
//! signed-in user is kept in the session by [`SessionCache`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use dompee_core::{Email, PasswordError, Role, validate_new_password};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{MessageQuery, Nav};
use crate::auth::SessionCache;
use crate::backend::{BackendError, Registration};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::CurrentAuth;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    CurrentAuth(auth): CurrentAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        nav: Nav::new(&auth, "/login"),
        error: query.error_text(),
        success: query.success_text(),
    }
}

/// Handle login form submission.
///
/// Sends the user to their role's landing page on success.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/login?error=email").into_response();
    };

    let password = SecretString::from(form.password);
    let user = match state.backend().login(email.as_str(), &password).await {
        Ok(user) => user,
        Err(BackendError::Rejected(reason)) => {
            tracing::info!(%reason, "Login rejected");
            return Redirect::to("/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Redirect::to("/login?error=network").into_response();
        }
    };

    let cache = SessionCache::new(&session, state.config().auth_reverify);
    match cache.login(user).await {
        Ok(auth) => {
            let role = auth.user().map_or(Role::User, |u| u.role);
            if let Some(user) = auth.user() {
                set_sentry_user(&user.userid, Some(&user.email));
            }
            add_breadcrumb("auth", "Signed in", Some(&[("role", role.as_str())]));
            Redirect::to(role.landing_path()).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to set session: {}", e);
            Redirect::to("/login?error=session").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    CurrentAuth(auth): CurrentAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        nav: Nav::new(&auth, "/register"),
        error: query.error_text(),
    }
}

/// Handle registration form submission.
///
/// New accounts always get the `user` role.
#[instrument(skip(state, form))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if form.first_name.trim().is_empty() {
        return Redirect::to("/register?error=name").into_response();
    }
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/register?error=email").into_response();
    };
    match validate_new_password(&form.password, &form.password_confirm) {
        Ok(()) => {}
        Err(PasswordError::Mismatch) => {
            return Redirect::to("/register?error=password_mismatch").into_response();
        }
        Err(PasswordError::TooShort) => {
            return Redirect::to("/register?error=password_too_short").into_response();
        }
    }

    let registration = Registration {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: email.into_inner(),
        phone: form.phone.trim().to_string(),
        address: form.address.trim().to_string(),
        password: SecretString::from(form.password),
        role: Role::User,
    };

    match state.backend().register_user(&registration).await {
        Ok(()) => Redirect::to("/login?success=registered").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            Redirect::to("/register?error=registration_failed").into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Err(e) = SessionCache::new(&session, state.config().auth_reverify)
        .logout()
        .await
    {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    Redirect::to("/login")
}
