//! Map page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use dompee_core::listing::with_map_links;
use dompee_core::{CategoryFilter, ListingQuery, SearchField, Shop, filter_shops};
use serde::Deserialize;
use tracing::instrument;

use super::{Nav, load_shops};
use crate::filters;
use crate::maps::embed_url;
use crate::middleware::CurrentAuth;
use crate::state::AppState;

/// Query parameters for the map page.
#[derive(Debug, Default, Deserialize)]
pub struct MapQuery {
    pub q: Option<String>,
    /// Id of the shop to show in the map frame.
    pub shop: Option<String>,
}

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub nav: Nav,
    pub shops: Vec<Shop>,
    pub query: String,
    pub selected: Option<Shop>,
    /// Embed URL for the selected shop, if its link can be framed.
    pub embed: Option<String>,
    pub load_error: bool,
}

/// Display shops that have a map link.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    CurrentAuth(auth): CurrentAuth,
    Query(query): Query<MapQuery>,
) -> impl IntoResponse {
    let (shops, load_error) = load_shops(&state).await;
    let mapped = with_map_links(&shops);

    let search = query.q.unwrap_or_default();
    let listing = ListingQuery {
        search: &search,
        category: CategoryFilter::All,
        sort: None,
        fields: SearchField::MAP,
    };
    let visible: Vec<Shop> = filter_shops(&mapped, &listing).into_iter().cloned().collect();

    let selected = query
        .shop
        .as_deref()
        .and_then(|id| mapped.iter().find(|s| s.id == id))
        .cloned();
    let embed = selected
        .as_ref()
        .and_then(|shop| embed_url(&shop.google_maps_url));

    MapTemplate {
        nav: Nav::new(&auth, "/map"),
        shops: visible,
        query: search.trim().to_string(),
        selected,
        embed,
        load_error,
    }
}
