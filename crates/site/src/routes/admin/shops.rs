//! Admin shop create and edit forms.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, RawForm, State},
    response::{IntoResponse, Redirect, Response},
};
use dompee_core::{CATEGORIES, Category, ShopDraft, ShopDraftError};
use tracing::instrument;

use crate::backend::{BackendError, next_registration_number};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::{Nav, message, path_segment, query_value};
use crate::state::AppState;

/// Shop form template, shared by create and edit.
#[derive(Template, WebTemplate)]
#[template(path = "admin/shop_form.html")]
pub struct ShopFormTemplate {
    pub nav: Nav,
    pub draft: ShopDraft,
    /// Id of the shop being edited; `None` when creating.
    pub shop_id: Option<String>,
    pub categories: &'static [Category],
    pub error: Option<String>,
}

impl ShopFormTemplate {
    fn new(nav: Nav, draft: ShopDraft, shop_id: Option<String>, error: Option<String>) -> Self {
        Self {
            nav,
            draft,
            shop_id,
            categories: &CATEGORIES,
            error,
        }
    }

    /// Form target.
    #[must_use]
    pub fn action(&self) -> String {
        match &self.shop_id {
            Some(id) => format!("/admin/shops/{}", path_segment(id)),
            None => "/admin/shops".to_string(),
        }
    }

    #[must_use]
    pub fn is_checked(&self, id: &str) -> bool {
        self.draft.categories.iter().any(|c| c == id)
    }

    /// Services as textarea content, one per line.
    #[must_use]
    pub fn services_text(&self) -> String {
        self.draft.services.join("\n")
    }
}

/// Build a draft from a submitted shop form.
///
/// Category checkboxes repeat the `categories` key. Services arrive as one
/// textarea, split on newlines and commas.
#[must_use]
pub fn parse_shop_form(body: &[u8]) -> ShopDraft {
    let mut draft = ShopDraft::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        let value = value.trim().to_string();
        match key.as_ref() {
            "shop_name" => draft.shop_name = value,
            "shop_owner_name" => draft.shop_owner_name = value,
            "phone_number" => draft.phone_number = value,
            "whatsapp_number" => draft.whatsapp_number = value,
            "address" => draft.address = value,
            "google_maps_url" => draft.google_maps_url = value,
            "youtube_link" => draft.youtube_link = value,
            "image" => draft.image = value,
            "categories" => {
                let id = value.to_lowercase();
                if !id.is_empty() && !draft.categories.contains(&id) {
                    draft.categories.push(id);
                }
            }
            "services" => {
                for service in value.split(['\n', ',']) {
                    draft.add_service(service);
                }
            }
            _ => {}
        }
    }
    draft
}

/// Inline text for a refused draft.
fn draft_error_text(err: &ShopDraftError) -> String {
    match err {
        ShopDraftError::MissingName => "Please enter the shop name.".to_string(),
        ShopDraftError::NoCategory => "Please select at least one category.".to_string(),
        ShopDraftError::NoService => "Please add at least one service.".to_string(),
        ShopDraftError::UnknownCategory(id) => format!("Unknown category: {id}"),
    }
}

/// Display the new shop form.
pub async fn new_page(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
    ShopFormTemplate::new(
        Nav::for_user(&admin, "/admin/dashboard"),
        ShopDraft::default(),
        None,
        None,
    )
}

/// Register a new shop.
///
/// Invalid drafts are shown again with the entered values.
#[instrument(skip(state, admin, body), fields(admin = %admin.email))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RawForm(body): RawForm,
) -> Response {
    let draft = parse_shop_form(&body);
    let nav = Nav::for_user(&admin, "/admin/dashboard");

    if let Err(e) = draft.validate() {
        let error = Some(draft_error_text(&e));
        return ShopFormTemplate::new(nav, draft, None, error).into_response();
    }

    let reg_no = next_registration_number();
    match state.backend().create_shop(&reg_no, &draft).await {
        Ok(()) => {
            add_breadcrumb("admin", "Created shop", Some(&[("reg_no", reg_no.as_str())]));
            tracing::info!(%reg_no, "Shop created");
            Redirect::to(&format!(
                "/admin/dashboard?success=shop_created&reg_no={}",
                query_value(&reg_no)
            ))
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Shop create failed");
            let error = Some(message(if e.is_transport() {
                "network"
            } else {
                "update_failed"
            }));
            ShopFormTemplate::new(nav, draft, None, error).into_response()
        }
    }
}

/// Display the edit form for an existing shop.
///
/// # Errors
///
/// Returns 404 if the backend does not know the shop.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response> {
    let shop = match state.backend().get_shop(&id).await {
        Ok(shop) => shop,
        Err(BackendError::NotFound(_) | BackendError::Malformed(_)) => {
            return Err(AppError::NotFound(format!("shop {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ShopFormTemplate::new(
        Nav::for_user(&admin, "/admin/dashboard"),
        ShopDraft::from_shop(&shop),
        Some(id),
        None,
    )
    .into_response())
}

/// Save edits to an existing shop.
#[instrument(skip(state, admin, body), fields(admin = %admin.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Response {
    let draft = parse_shop_form(&body);
    let nav = Nav::for_user(&admin, "/admin/dashboard");

    if let Err(e) = draft.validate() {
        let error = Some(draft_error_text(&e));
        return ShopFormTemplate::new(nav, draft, Some(id), error).into_response();
    }

    match state.backend().update_shop(&id, &draft).await {
        Ok(()) => {
            add_breadcrumb("admin", "Updated shop", Some(&[("reg_no", id.as_str())]));
            Redirect::to("/admin/dashboard?success=shop_updated").into_response()
        }
        Err(BackendError::Rejected(reason)) => {
            tracing::info!(%reason, "Shop update rejected");
            ShopFormTemplate::new(nav, draft, Some(id), Some(reason)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Shop update failed");
            Redirect::to("/admin/dashboard?error=update_failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shop_form_repeated_categories_and_services() {
        let body = b"shop_name=+Perera+Stores+&categories=grocery&categories=Bakery\
                     &services=Delivery%0D%0ARepairs%2C+Delivery%2C+&youtube_link=";
        let draft = parse_shop_form(body);

        assert_eq!(draft.shop_name, "Perera Stores");
        assert_eq!(draft.categories, vec!["grocery", "bakery"]);
        assert_eq!(draft.services, vec!["Delivery", "Repairs"]);
        assert!(draft.youtube_link.is_empty());
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn test_parse_shop_form_duplicate_category_kept_once() {
        let draft = parse_shop_form(b"categories=grocery&categories=grocery&categories=");
        assert_eq!(draft.categories, vec!["grocery"]);
    }

    #[test]
    fn test_parse_shop_form_ignores_unknown_keys() {
        let draft = parse_shop_form(b"shop_name=A&rating=5&reg_no=DMP-2025-0001");
        assert_eq!(draft.shop_name, "A");
        assert_eq!(draft.validate(), Err(ShopDraftError::NoCategory));
    }

    #[test]
    fn test_form_template_action_and_checks() {
        let draft = ShopDraft {
            categories: vec!["pharmacy".to_string()],
            services: vec!["Delivery".to_string(), "Repairs".to_string()],
            ..ShopDraft::default()
        };
        let form = ShopFormTemplate::new(Nav::default(), draft, None, None);
        assert_eq!(form.action(), "/admin/shops");
        assert!(form.is_checked("pharmacy"));
        assert!(!form.is_checked("grocery"));
        assert_eq!(form.services_text(), "Delivery\nRepairs");

        let form = ShopFormTemplate::new(
            Nav::default(),
            ShopDraft::default(),
            Some("DMP-2025-4821".to_string()),
            None,
        );
        assert_eq!(form.action(), "/admin/shops/DMP-2025-4821");

        let form = ShopFormTemplate::new(
            Nav::default(),
            ShopDraft::default(),
            Some("legacy 7/b".to_string()),
            None,
        );
        assert_eq!(form.action(), "/admin/shops/legacy%207%2Fb");
    }

    #[test]
    fn test_draft_error_text() {
        assert_eq!(
            draft_error_text(&ShopDraftError::NoService),
            "Please add at least one service."
        );
    }
}
