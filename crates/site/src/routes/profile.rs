//! Profile route handlers (requires auth).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use dompee_core::{PasswordError, User, validate_new_password};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{MessageQuery, Nav};
use crate::auth::SessionCache;
use crate::backend::{BackendError, ProfileUpdate};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Password change form data.
#[derive(Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub user: User,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the signed-in user's profile.
pub async fn show(
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ProfileTemplate {
        nav: Nav::for_user(&user, "/profile"),
        user,
        error: query.error_text(),
        success: query.success_text(),
    }
}

/// Save profile edits.
///
/// The session's cached user is updated as soon as the backend has taken
/// the write, so the header shows the new name straight away.
#[instrument(skip(state, session, user, form), fields(email = %user.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Redirect {
    if form.first_name.trim().is_empty() {
        return Redirect::to("/profile?error=name");
    }

    let update = ProfileUpdate {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        address: form.address.trim().to_string(),
    };

    if let Err(e) = state.backend().update_profile(&user.email, &update).await {
        tracing::warn!(error = %e, "Profile update failed");
        return Redirect::to("/profile?error=profile_failed");
    }

    let updated = User {
        first_name: update.first_name,
        last_name: update.last_name,
        phone: update.phone,
        address: update.address,
        ..user
    };
    let cache = SessionCache::new(&session, state.config().auth_reverify);
    if let Err(e) = cache.update_cached_user(&updated).await {
        tracing::error!("Failed to update cached user: {}", e);
    }

    Redirect::to("/profile?success=profile_saved")
}

/// Change the signed-in user's password.
#[instrument(skip(state, user, form), fields(email = %user.email))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Redirect {
    match validate_new_password(&form.new_password, &form.confirm_password) {
        Ok(()) => {}
        Err(PasswordError::Mismatch) => return Redirect::to("/profile?error=password_mismatch"),
        Err(PasswordError::TooShort) => {
            return Redirect::to("/profile?error=password_too_short");
        }
    }

    let current = SecretString::from(form.current_password);
    let new = SecretString::from(form.new_password);
    match state
        .backend()
        .update_password(&user.email, &current, &new)
        .await
    {
        Ok(()) => Redirect::to("/profile?success=password_saved"),
        Err(BackendError::Rejected(reason)) => {
            tracing::info!(%reason, "Password change rejected");
            Redirect::to("/profile?error=password_rejected")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password change failed");
            Redirect::to("/profile?error=network")
        }
    }
}
