//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Directory
//! GET  /shops                  - Shop list (search, category, sort)
//! GET  /shops/{id}             - Shop detail
//! POST /shops/{id}/reviews     - Leave a review (kept in the session)
//! GET  /categories             - Category grid
//! GET  /map                    - Shops with map links
//! GET  /about, /privacy, /terms
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//!
//! # Profile (requires auth)
//! GET  /profile                - Profile page
//! POST /profile                - Save profile
//! POST /profile/password       - Change password
//!
//! # Admin (requires admin)
//! GET  /admin                  - Redirect to dashboard
//! GET  /admin/dashboard        - Shop table and stats
//! GET  /admin/shops/new        - New shop form
//! POST /admin/shops            - Create shop
//! GET  /admin/shops/{id}/edit  - Edit shop form
//! POST /admin/shops/{id}       - Update shop
//! POST /admin/shops/{id}/delete - Delete shop
//! GET  /admin/users            - User table
//! POST /admin/users/update     - Update a user
//! POST /admin/users/delete     - Delete a user
//! ```

pub mod admin;
pub mod auth;
pub mod categories;
pub mod home;
pub mod map;
pub mod pages;
pub mod profile;
pub mod shops;

use axum::{
    Router,
    routing::{get, post},
};
use dompee_core::{Shop, User};
use serde::Deserialize;

use crate::auth::AuthState;
use crate::state::AppState;

// =============================================================================
// Shared view data
// =============================================================================

/// Header state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    /// Display name of the signed-in user.
    pub user_name: Option<String>,
    pub is_admin: bool,
    /// Path of the page being rendered, for highlighting.
    pub current: &'static str,
}

impl Nav {
    #[must_use]
    pub fn new(auth: &AuthState, current: &'static str) -> Self {
        let user = auth.user();
        Self {
            user_name: user.map(|u| {
                let name = u.full_name();
                if name.is_empty() { u.email.clone() } else { name }
            }),
            is_admin: user.is_some_and(User::is_admin),
            current,
        }
    }

    /// Header for a page behind an auth extractor.
    #[must_use]
    pub fn for_user(user: &User, current: &'static str) -> Self {
        Self::new(&AuthState::Cached(user.clone()), current)
    }

    #[must_use]
    pub fn is(&self, path: &str) -> bool {
        self.current == path
    }
}

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl MessageQuery {
    #[must_use]
    pub fn error_text(&self) -> Option<String> {
        self.error.as_deref().map(message)
    }

    #[must_use]
    pub fn success_text(&self) -> Option<String> {
        self.success.as_deref().map(message)
    }
}

/// Human text for a redirect message code.
#[must_use]
pub fn message(code: &str) -> String {
    match code {
        "credentials" => "Invalid email or password.",
        "network" => "Could not reach the directory. Please check your connection and try again.",
        "session" => "Your session could not be saved. Please try again.",
        "email" => "Please enter a valid email address.",
        "name" => "Please enter your first name.",
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Password must be at least 6 characters.",
        "password_rejected" => "Failed to update password. Please check your current password.",
        "registration_failed" => "Registration failed. Please try again.",
        "registered" => "Registration successful. Please sign in.",
        "profile_saved" => "Profile updated successfully!",
        "profile_failed" => "Error saving profile.",
        "password_saved" => {
            "Password updated successfully! Please use your new password on next login."
        }
        "rating" => "Please choose a rating from 1 to 5 stars.",
        "comment" => "Please write a comment.",
        "review_saved" => "Thank you! Your review has been submitted successfully.",
        "shop_created" => "Shop registered successfully.",
        "shop_updated" => "Shop updated successfully!",
        "shop_deleted" => "Shop deleted.",
        "delete_failed" => "Delete failed.",
        "user_updated" => "User updated.",
        "user_deleted" => "User deleted.",
        "update_failed" => "Failed to update.",
        "self_delete" => "You cannot delete yourself!",
        _ => "Something went wrong. Please try again.",
    }
    .to_string()
}

/// Fetch every shop, failing closed to an empty list.
///
/// The flag is true when the list could not be loaded.
pub(crate) async fn load_shops(state: &AppState) -> (Vec<Shop>, bool) {
    match state.backend().get_shops().await {
        Ok(shops) => (shops, false),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load shops, showing none");
            (Vec::new(), true)
        }
    }
}

/// Percent-encode a value for use as one path segment.
///
/// Shop ids come straight from sheet cells, so anything may appear in them.
#[must_use]
pub fn path_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        // `+` only means space in query strings; a literal `+` is already `%2B`
        .replace('+', "%20")
}

/// Percent-encode a value for use in a query string.
#[must_use]
pub fn query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Path of a shop's detail page.
#[must_use]
pub fn shop_path(id: &str) -> String {
    format!("/shops/{}", path_segment(id))
}

/// `wa.me` link for a phone number, digits only.
#[must_use]
pub fn whatsapp_link(number: &str) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(format!("https://wa.me/{digits}"))
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Create the shop routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shops::index))
        .route("/{id}", get(shops::show))
        .route("/{id}/reviews", post(shops::add_review))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route("/password", post(profile::update_password))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/dashboard", get(admin::dashboard::show))
        .route("/shops", post(admin::shops::create))
        .route("/shops/new", get(admin::shops::new_page))
        .route("/shops/{id}", post(admin::shops::update))
        .route("/shops/{id}/edit", get(admin::shops::edit_page))
        .route("/shops/{id}/delete", post(admin::dashboard::delete_shop))
        .route("/users", get(admin::users::index))
        .route("/users/update", post(admin::users::update))
        .route("/users/delete", post(admin::users::delete))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/shops", shop_routes())
        .route("/categories", get(categories::index))
        .route("/map", get(map::index))
        .route("/about", get(pages::about))
        .route("/privacy", get(pages::privacy))
        .route("/terms", get(pages::terms))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .nest("/profile", profile_routes())
        .nest("/admin", admin_routes())
}

#[cfg(test)]
mod tests {
    use dompee_core::Role;

    use super::*;

    fn user(first_name: &str, role: Role) -> User {
        User {
            userid: "1".to_string(),
            first_name: first_name.to_string(),
            last_name: String::new(),
            email: "a@dompee.lk".to_string(),
            phone: String::new(),
            address: String::new(),
            role,
        }
    }

    #[test]
    fn test_nav_from_auth_state() {
        let nav = Nav::new(&AuthState::LoggedOut, "/");
        assert_eq!(nav.user_name, None);
        assert!(!nav.is_admin);
        assert!(nav.is("/"));

        let nav = Nav::new(&AuthState::Cached(user("Admin", Role::Admin)), "/shops");
        assert_eq!(nav.user_name.as_deref(), Some("Admin"));
        assert!(nav.is_admin);

        let nav = Nav::new(&AuthState::Verified(user("", Role::User)), "/");
        assert_eq!(nav.user_name.as_deref(), Some("a@dompee.lk"));
    }

    #[test]
    fn test_shop_path_encodes_id() {
        assert_eq!(shop_path("DMP-2025-1001"), "/shops/DMP-2025-1001");
        assert_eq!(shop_path("a b?x=1"), "/shops/a%20b%3Fx%3D1");
        assert_eq!(shop_path("a/b#c+d"), "/shops/a%2Fb%23c%2Bd");
        assert_eq!(path_segment("a\nb"), "a%0Ab");
        assert_eq!(query_value("a b&c"), "a+b%26c");
    }

    #[test]
    fn test_whatsapp_link() {
        assert_eq!(
            whatsapp_link("+94 77 123 4567").as_deref(),
            Some("https://wa.me/94771234567")
        );
        assert_eq!(whatsapp_link(" - "), None);
    }

    #[test]
    fn test_message_codes() {
        assert_eq!(message("credentials"), "Invalid email or password.");
        assert_eq!(message("self_delete"), "You cannot delete yourself!");
        assert!(message("unknown-code").starts_with("Something went wrong"));

        let query = MessageQuery {
            error: Some("password_mismatch".to_string()),
            success: None,
        };
        assert_eq!(query.error_text().as_deref(), Some("Passwords do not match."));
        assert_eq!(query.success_text(), None);
    }
}
