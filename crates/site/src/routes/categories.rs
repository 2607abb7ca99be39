//! Category grid route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use dompee_core::listing::category_counts;
use tracing::instrument;

use super::home::CategoryCount;
use super::{Nav, load_shops};
use crate::filters;
use crate::middleware::CurrentAuth;
use crate::state::AppState;

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories.html")]
pub struct CategoriesTemplate {
    pub nav: Nav,
    pub categories: Vec<CategoryCount>,
    pub total_shops: usize,
    pub load_error: bool,
}

/// Display every category with the number of shops listed under it.
#[instrument(skip(state, auth))]
pub async fn index(State(state): State<AppState>, CurrentAuth(auth): CurrentAuth) -> impl IntoResponse {
    let (shops, load_error) = load_shops(&state).await;

    CategoriesTemplate {
        nav: Nav::new(&auth, "/categories"),
        categories: category_counts(&shops)
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
        total_shops: shops.len(),
        load_error,
    }
}
