//! Shop list and detail route handlers.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use dompee_core::{
    CATEGORIES, Category, CategoryFilter, ListingQuery, Review, ReviewError, SearchField, Shop,
    SortBy, filter_shops,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{MessageQuery, Nav, load_shops, shop_path, whatsapp_link};
use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CurrentAuth;
use crate::models::session_keys;
use crate::state::AppState;

/// Reviews left during this session, by shop id.
type LocalReviews = HashMap<String, Vec<Review>>;

// =============================================================================
// Query / Form Types
// =============================================================================

/// Query parameters for the shop list.
#[derive(Debug, Default, Deserialize)]
pub struct ShopListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Shop list template.
#[derive(Template, WebTemplate)]
#[template(path = "shops/index.html")]
pub struct ShopListTemplate {
    pub nav: Nav,
    pub shops: Vec<Shop>,
    pub search: String,
    pub category: String,
    pub sort: &'static str,
    pub categories: &'static [Category],
    pub load_error: bool,
}

/// Shop detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shops/show.html")]
pub struct ShopDetailTemplate {
    pub nav: Nav,
    pub shop: Shop,
    pub category_labels: Vec<String>,
    pub whatsapp_url: Option<String>,
    pub reviews: Vec<Review>,
    pub signed_in: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the shop list.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    CurrentAuth(auth): CurrentAuth,
    Query(query): Query<ShopListQuery>,
) -> impl IntoResponse {
    let (shops, load_error) = load_shops(&state).await;

    let search = query.search.unwrap_or_default();
    let category = CategoryFilter::parse(query.category.as_deref().unwrap_or_default());
    let sort = SortBy::parse(query.sort.as_deref().unwrap_or_default());

    let listing = ListingQuery {
        search: &search,
        category: category.clone(),
        sort: Some(sort),
        fields: SearchField::PUBLIC,
    };
    let matched = filter_shops(&shops, &listing).into_iter().cloned().collect();

    ShopListTemplate {
        nav: Nav::new(&auth, "/shops"),
        shops: matched,
        search: search.trim().to_string(),
        category: category.as_str().to_string(),
        sort: sort.as_str(),
        categories: &CATEGORIES,
        load_error,
    }
}

/// Display one shop with the reviews left during this session.
///
/// # Errors
///
/// Returns 404 if the backend does not know the shop.
#[instrument(skip(state, auth, session))]
pub async fn show(
    State(state): State<AppState>,
    CurrentAuth(auth): CurrentAuth,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let shop = match state.backend().get_shop(&id).await {
        Ok(shop) => shop,
        Err(BackendError::NotFound(_) | BackendError::Malformed(_)) => {
            return Err(AppError::NotFound(format!("shop {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    let reviews = session
        .get::<LocalReviews>(session_keys::LOCAL_REVIEWS)
        .await?
        .and_then(|mut all| all.remove(&shop.id))
        .unwrap_or_default();

    Ok(ShopDetailTemplate {
        nav: Nav::new(&auth, "/shops"),
        category_labels: shop.categories.iter().map(|c| Category::label(c)).collect(),
        whatsapp_url: whatsapp_link(&shop.whatsapp_number),
        shop,
        reviews,
        signed_in: auth.is_logged_in(),
        error: query.error_text(),
        success: query.success_text(),
    }
    .into_response())
}

/// Add a review to this session's copy of the shop page.
///
/// Reviews are not sent to the backend.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(auth, session, form))]
pub async fn add_review(
    CurrentAuth(auth): CurrentAuth,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let path = shop_path(&id);
    let rating = form.rating.trim().parse::<u8>().unwrap_or(0);
    let review = match Review::create(&id, auth.user(), rating, &form.comment, chrono::Utc::now()) {
        Ok(review) => review,
        Err(ReviewError::Rating) => return Ok(Redirect::to(&format!("{path}?error=rating"))),
        Err(ReviewError::EmptyComment) => {
            return Ok(Redirect::to(&format!("{path}?error=comment")));
        }
    };

    let mut all = session
        .get::<LocalReviews>(session_keys::LOCAL_REVIEWS)
        .await?
        .unwrap_or_default();
    all.entry(id).or_default().insert(0, review);
    session.insert(session_keys::LOCAL_REVIEWS, &all).await?;

    Ok(Redirect::to(&format!("{path}?success=review_saved")))
}
