//! Admin user management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use dompee_core::{Role, User};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::{ProfileUpdate, UserUpdate};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::{Nav, message};
use crate::state::AppState;

/// Query parameters for the user table.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Admin edit of one account. The email identifies the account.
#[derive(Debug, Deserialize)]
pub struct UserUpdateForm {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UserDeleteForm {
    pub email: String,
}

/// Admin users template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub nav: Nav,
    pub users: Vec<User>,
    pub total: usize,
    pub search: String,
    /// Email of the signed-in admin; their row has no delete button.
    pub current_email: String,
    pub roles: &'static [Role],
    pub error: Option<String>,
    pub success: Option<String>,
    pub load_error: bool,
}

const ROLES: [Role; 3] = [Role::User, Role::ShopOwner, Role::Admin];

/// Users whose email or first name contains `search`, case-insensitively.
#[must_use]
pub fn search_users<'u>(users: &'u [User], search: &str) -> Vec<&'u User> {
    let needle = search.trim().to_lowercase();
    users
        .iter()
        .filter(|u| {
            needle.is_empty()
                || u.email.to_lowercase().contains(&needle)
                || u.first_name.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Display the user table.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<UsersQuery>,
) -> impl IntoResponse {
    let (users, load_error) = match state.backend().get_users().await {
        Ok(users) => (users, false),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load users, showing none");
            (Vec::new(), true)
        }
    };

    let search = query.search.unwrap_or_default();
    let matched = search_users(&users, &search).into_iter().cloned().collect();

    UsersTemplate {
        nav: Nav::for_user(&admin, "/admin/users"),
        users: matched,
        total: users.len(),
        search: search.trim().to_string(),
        current_email: admin.email,
        roles: &ROLES,
        error: query.error.as_deref().map(message),
        success: query.success.as_deref().map(message),
        load_error,
    }
}

/// Save an admin's edit of an account.
#[instrument(skip(state, admin, form), fields(admin = %admin.email, email = %form.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<UserUpdateForm>,
) -> Redirect {
    let update = UserUpdate {
        profile: ProfileUpdate {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            address: form.address.trim().to_string(),
        },
        role: Role::from_remote(&form.role),
    };

    match state.backend().update_user(form.email.trim(), &update).await {
        Ok(()) => {
            add_breadcrumb("admin", "Updated user", Some(&[("role", update.role.as_str())]));
            Redirect::to("/admin/users?success=user_updated")
        }
        Err(e) => {
            tracing::warn!(error = %e, "User update failed");
            Redirect::to("/admin/users?error=update_failed")
        }
    }
}

/// Delete an account. Admins cannot delete themselves.
#[instrument(skip(state, admin, form), fields(admin = %admin.email, email = %form.email))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<UserDeleteForm>,
) -> Redirect {
    let email = form.email.trim();
    if email.eq_ignore_ascii_case(&admin.email) {
        return Redirect::to("/admin/users?error=self_delete");
    }

    match state.backend().delete_user(email).await {
        Ok(()) => {
            add_breadcrumb("admin", "Deleted user", None);
            Redirect::to("/admin/users?success=user_deleted")
        }
        Err(e) => {
            tracing::warn!(error = %e, "User delete failed");
            Redirect::to("/admin/users?error=delete_failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first_name: &str, email: &str) -> User {
        User {
            userid: String::new(),
            first_name: first_name.to_string(),
            last_name: String::new(),
            email: email.to_string(),
            phone: String::new(),
            address: String::new(),
            role: Role::User,
        }
    }

    #[test]
    fn test_search_users_by_email_or_first_name() {
        let users = vec![
            user("Nimal", "nimal@example.com"),
            user("Kamala", "k.perera@example.com"),
            user("Sunil", "sunil@dompee.lk"),
        ];

        let names = |found: Vec<&User>| -> Vec<String> {
            found.iter().map(|u| u.first_name.clone()).collect()
        };
        assert_eq!(names(search_users(&users, "PERERA")), vec!["Kamala"]);
        assert_eq!(names(search_users(&users, " nim ")), vec!["Nimal"]);
        assert_eq!(names(search_users(&users, "dompee")), vec!["Sunil"]);
        assert_eq!(search_users(&users, "").len(), 3);
        assert!(search_users(&users, "zzz").is_empty());
    }
}
