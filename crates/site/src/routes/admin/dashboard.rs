//! Admin dashboard: shop table, stats and shop deletion.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use dompee_core::{
    CATEGORIES, Category, CategoryFilter, ListingQuery, SearchField, Shop, ShopStats, filter_shops,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::{Nav, load_shops, message};
use crate::state::AppState;

/// Query parameters for the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    /// Registration number of a shop created by the previous request.
    pub reg_no: Option<String>,
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub shops: Vec<Shop>,
    pub stats: ShopStats,
    pub search: String,
    pub category: String,
    pub categories: &'static [Category],
    pub created_reg_no: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub load_error: bool,
}

/// Display every shop with search and category filters.
///
/// Rows keep the backend's order.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    let (shops, load_error) = load_shops(&state).await;
    let stats = ShopStats::from_shops(&shops);

    let search = query.search.unwrap_or_default();
    let category = CategoryFilter::parse(query.category.as_deref().unwrap_or_default());
    let listing = ListingQuery {
        search: &search,
        category: category.clone(),
        sort: None,
        fields: SearchField::ADMIN,
    };
    let matched = filter_shops(&shops, &listing).into_iter().cloned().collect();

    DashboardTemplate {
        nav: Nav::for_user(&admin, "/admin/dashboard"),
        shops: matched,
        stats,
        search: search.trim().to_string(),
        category: category.as_str().to_string(),
        categories: &CATEGORIES,
        created_reg_no: query.reg_no.filter(|r| !r.trim().is_empty()),
        error: query.error.as_deref().map(message),
        success: query.success.as_deref().map(message),
        load_error,
    }
}

/// Delete a shop and return to the dashboard.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn delete_shop(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Redirect {
    match state.backend().delete_shop(&id).await {
        Ok(()) => {
            add_breadcrumb("admin", "Deleted shop", Some(&[("id", id.as_str())]));
            Redirect::to("/admin/dashboard?success=shop_deleted")
        }
        Err(e) => {
            tracing::warn!(error = %e, %id, "Shop delete failed");
            Redirect::to("/admin/dashboard?error=delete_failed")
        }
    }
}
