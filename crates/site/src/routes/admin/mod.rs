//! Admin panel route handlers.
//!
//! Every handler here takes [`crate::middleware::RequireAdmin`]; signed-out
//! visitors go to the login page and other roles to their landing page.

pub mod dashboard;
pub mod shops;
pub mod users;

use axum::response::Redirect;

/// `/admin` has no page of its own.
pub async fn index() -> Redirect {
    Redirect::to("/admin/dashboard")
}
