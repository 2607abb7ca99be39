//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use dompee_core::listing::{ShopStats, category_counts, featured, top_rated};
use dompee_core::{Category, Shop};
use tracing::instrument;

use super::{Nav, load_shops};
use crate::filters;
use crate::middleware::CurrentAuth;
use crate::state::AppState;

/// Shops shown in the featured grid.
const FEATURED_COUNT: usize = 6;

/// Shops shown in the top rated strip.
const TOP_RATED_COUNT: usize = 3;

/// A catalogue category with its shop count.
#[derive(Clone)]
pub struct CategoryCount {
    pub category: &'static Category,
    pub count: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub featured: Vec<Shop>,
    pub top_rated: Vec<Shop>,
    pub categories: Vec<CategoryCount>,
    pub stats: ShopStats,
    pub load_error: bool,
}

/// Display the home page.
#[instrument(skip(state, auth))]
pub async fn home(State(state): State<AppState>, CurrentAuth(auth): CurrentAuth) -> impl IntoResponse {
    let (shops, load_error) = load_shops(&state).await;

    HomeTemplate {
        nav: Nav::new(&auth, "/"),
        featured: featured(&shops, FEATURED_COUNT).into_iter().cloned().collect(),
        top_rated: top_rated(&shops, TOP_RATED_COUNT)
            .into_iter()
            .cloned()
            .collect(),
        categories: category_counts(&shops)
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
        stats: ShopStats::from_shops(&shops),
        load_error,
    }
}
