//! Shop listings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::category::Category;

/// Image shown when a shop has none.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder-shop.svg";

/// A canonical shop listing.
///
/// Built from backend JSON by [`crate::normalize::normalize_shop`]; every
/// field has a defined value regardless of which aliases the source used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Registration number, or a positional placeholder for list rendering.
    pub id: String,
    pub reg_no: String,
    pub shop_name: String,
    pub shop_owner_name: String,
    pub phone_number: String,
    pub whatsapp_number: String,
    pub address: String,
    /// Trimmed, non-empty service names.
    pub services: Vec<String>,
    pub google_maps_url: String,
    pub youtube_link: Option<String>,
    pub image: String,
    /// Trimmed, lower-cased, non-empty category ids.
    pub categories: Vec<String>,
    pub rating: f64,
    pub review_count: u32,
    pub created_at: String,
}

impl Shop {
    /// Returns true if the shop is listed under `category` (case-insensitive).
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        let wanted = category.trim().to_lowercase();
        self.categories.iter().any(|c| *c == wanted)
    }

    /// Display label of the first category, if any.
    #[must_use]
    pub fn primary_category_label(&self) -> Option<String> {
        self.categories.first().map(|id| Category::label(id))
    }
}

/// Editable fields of a shop, as submitted by the admin create/edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopDraft {
    pub shop_name: String,
    pub shop_owner_name: String,
    pub phone_number: String,
    pub whatsapp_number: String,
    pub address: String,
    pub google_maps_url: String,
    pub youtube_link: String,
    pub image: String,
    pub categories: Vec<String>,
    pub services: Vec<String>,
}

/// Reasons a shop draft is refused before it is sent to the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShopDraftError {
    #[error("shop name is required")]
    MissingName,
    #[error("select at least one category")]
    NoCategory,
    #[error("add at least one service")]
    NoService,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl ShopDraft {
    /// Pre-fill a draft from an existing shop (edit form).
    #[must_use]
    pub fn from_shop(shop: &Shop) -> Self {
        Self {
            shop_name: shop.shop_name.clone(),
            shop_owner_name: shop.shop_owner_name.clone(),
            phone_number: shop.phone_number.clone(),
            whatsapp_number: shop.whatsapp_number.clone(),
            address: shop.address.clone(),
            google_maps_url: shop.google_maps_url.clone(),
            youtube_link: shop.youtube_link.clone().unwrap_or_default(),
            image: shop.image.clone(),
            categories: shop.categories.clone(),
            services: shop.services.clone(),
        }
    }

    /// Add a service unless it is blank or already present.
    pub fn add_service(&mut self, service: &str) {
        let service = service.trim();
        if !service.is_empty() && !self.services.iter().any(|s| s == service) {
            self.services.push(service.to_string());
        }
    }

    /// Check the draft before any network call.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: missing name, no category, no
    /// service, or a category outside the catalogue.
    pub fn validate(&self) -> Result<(), ShopDraftError> {
        if self.shop_name.trim().is_empty() {
            return Err(ShopDraftError::MissingName);
        }
        if self.categories.is_empty() {
            return Err(ShopDraftError::NoCategory);
        }
        if self.services.is_empty() {
            return Err(ShopDraftError::NoService);
        }
        if let Some(unknown) = self
            .categories
            .iter()
            .find(|id| Category::find(id).is_none())
        {
            return Err(ShopDraftError::UnknownCategory(unknown.clone()));
        }
        Ok(())
    }
}

/// Registration number for a new shop: `DMP-<year>-<serial>`.
#[must_use]
pub fn registration_number(year: i32, serial: u16) -> String {
    format!("DMP-{year}-{serial:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ShopDraft {
        ShopDraft {
            shop_name: "Perera Stores".to_string(),
            categories: vec!["grocery".to_string()],
            services: vec!["Delivery".to_string()],
            ..ShopDraft::default()
        }
    }

    #[test]
    fn test_validate_accepts_complete_draft() {
        assert_eq!(draft().validate(), Ok(()));
    }

    #[test]
    fn test_validate_requires_category_and_service() {
        let mut d = draft();
        d.categories.clear();
        assert_eq!(d.validate(), Err(ShopDraftError::NoCategory));

        let mut d = draft();
        d.services.clear();
        assert_eq!(d.validate(), Err(ShopDraftError::NoService));

        let mut d = draft();
        d.shop_name = "  ".to_string();
        assert_eq!(d.validate(), Err(ShopDraftError::MissingName));
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let mut d = draft();
        d.categories.push("florist".to_string());
        assert_eq!(
            d.validate(),
            Err(ShopDraftError::UnknownCategory("florist".to_string()))
        );
    }

    #[test]
    fn test_add_service_skips_blank_and_duplicates() {
        let mut d = draft();
        d.add_service("  ");
        d.add_service(" Delivery ");
        d.add_service("Repairs");
        assert_eq!(d.services, vec!["Delivery", "Repairs"]);
    }

    #[test]
    fn test_registration_number_format() {
        assert_eq!(registration_number(2025, 4821), "DMP-2025-4821");
        assert_eq!(registration_number(2025, 7), "DMP-2025-0007");
    }
}
