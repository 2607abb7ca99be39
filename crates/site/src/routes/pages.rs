//! Static page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use super::Nav;
use crate::filters;
use crate::middleware::CurrentAuth;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

/// Privacy policy template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/privacy.html")]
pub struct PrivacyTemplate {
    pub nav: Nav,
}

/// Terms of service template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/terms.html")]
pub struct TermsTemplate {
    pub nav: Nav,
}

/// Display the About page.
pub async fn about(CurrentAuth(auth): CurrentAuth) -> impl IntoResponse {
    AboutTemplate {
        nav: Nav::new(&auth, "/about"),
    }
}

/// Display the Privacy Policy page.
pub async fn privacy(CurrentAuth(auth): CurrentAuth) -> impl IntoResponse {
    PrivacyTemplate {
        nav: Nav::new(&auth, "/privacy"),
    }
}

/// Display the Terms of Service page.
pub async fn terms(CurrentAuth(auth): CurrentAuth) -> impl IntoResponse {
    TermsTemplate {
        nav: Nav::new(&auth, "/terms"),
    }
}
