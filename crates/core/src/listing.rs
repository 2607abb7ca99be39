//! Search, category filtering and sorting of shop listings.
//!
//! Every page that shows a list of shops (public list, admin dashboard, map)
//! goes through [`filter_shops`] with its own [`SearchField`] preset. The
//! pipeline is pure: it borrows the shops and never reorders the input slice.

use std::cmp::Ordering;

use crate::types::{CATEGORIES, Category, Shop};

/// A shop attribute the free-text search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Owner,
    RegNo,
    Address,
    Services,
    Categories,
}

impl SearchField {
    /// Public shop list.
    pub const PUBLIC: &'static [Self] = &[Self::Name, Self::Services];
    /// Admin dashboard.
    pub const ADMIN: &'static [Self] = &[Self::Name, Self::Owner, Self::RegNo];
    /// Map page.
    pub const MAP: &'static [Self] = &[Self::Name, Self::Address, Self::Categories];

    /// Returns true if this attribute of `shop` contains `needle`, which must
    /// already be lower-cased.
    fn matches(self, shop: &Shop, needle: &str) -> bool {
        let contains = |haystack: &str| haystack.to_lowercase().contains(needle);
        match self {
            Self::Name => contains(&shop.shop_name),
            Self::Owner => contains(&shop.shop_owner_name),
            Self::RegNo => contains(&shop.reg_no),
            Self::Address => contains(&shop.address),
            Self::Services => shop.services.iter().any(|s| contains(s)),
            Self::Categories => shop.categories.iter().any(|c| contains(c)),
        }
    }
}

/// Sort order for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Highest rated first.
    #[default]
    Rating,
    /// Alphabetical by shop name.
    Name,
}

impl SortBy {
    /// Parse a `sort` query value. Anything other than `name` sorts by rating.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("name") {
            Self::Name
        } else {
            Self::Rating
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Name => "name",
        }
    }

    fn compare(self, a: &Shop, b: &Shop) -> Ordering {
        match self {
            Self::Rating => b.rating.total_cmp(&a.rating),
            Self::Name => a
                .shop_name
                .to_lowercase()
                .cmp(&b.shop_name.to_lowercase()),
        }
    }
}

/// Category restriction for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Lower-cased category id.
    Only(String),
}

impl CategoryFilter {
    /// Parse a `category` query value; empty or `all` means no restriction.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_lowercase();
        if value.is_empty() || value == "all" {
            Self::All
        } else {
            Self::Only(value)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Only(id) => id,
        }
    }

    fn admits(&self, shop: &Shop) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => shop.categories.iter().any(|c| c == id),
        }
    }
}

/// Parameters of one listing request.
#[derive(Debug, Clone)]
pub struct ListingQuery<'a> {
    pub search: &'a str,
    pub category: CategoryFilter,
    /// `None` keeps source order.
    pub sort: Option<SortBy>,
    pub fields: &'a [SearchField],
}

impl Default for ListingQuery<'_> {
    fn default() -> Self {
        Self {
            search: "",
            category: CategoryFilter::All,
            sort: None,
            fields: SearchField::PUBLIC,
        }
    }
}

/// Apply search, category filter and sort to `shops`.
///
/// Search is a case-insensitive substring match on the query's fields; a
/// blank query matches everything. Sorting is stable, so shops that compare
/// equal keep their source order.
#[must_use]
pub fn filter_shops<'s>(shops: &'s [Shop], query: &ListingQuery<'_>) -> Vec<&'s Shop> {
    let needle = query.search.trim().to_lowercase();

    let mut matched: Vec<&Shop> = shops
        .iter()
        .filter(|shop| query.category.admits(shop))
        .filter(|shop| {
            needle.is_empty() || query.fields.iter().any(|f| f.matches(shop, &needle))
        })
        .collect();

    if let Some(sort) = query.sort {
        matched.sort_by(|a, b| sort.compare(a, b));
    }
    matched
}

/// Headline numbers shown on the home page and admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShopStats {
    pub total_shops: usize,
    pub total_reviews: u64,
    /// Mean rating over all shops, 0 when there are none.
    pub average_rating: f64,
}

impl ShopStats {
    #[must_use]
    pub fn from_shops(shops: &[Shop]) -> Self {
        let total_shops = shops.len();
        let total_reviews = shops.iter().map(|s| u64::from(s.review_count)).sum();
        let average_rating = if total_shops == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n = total_shops as f64;
            shops.iter().map(|s| s.rating).sum::<f64>() / n
        };
        Self {
            total_shops,
            total_reviews,
            average_rating,
        }
    }

    /// Average rating with one decimal, e.g. `4.2`.
    #[must_use]
    pub fn average_label(&self) -> String {
        format!("{:.1}", self.average_rating)
    }
}

/// Number of shops in each catalogue category, in catalogue order.
#[must_use]
pub fn category_counts(shops: &[Shop]) -> Vec<(&'static Category, usize)> {
    CATEGORIES
        .iter()
        .map(|cat| (cat, shops.iter().filter(|s| s.in_category(cat.id)).count()))
        .collect()
}

/// The `n` highest rated shops.
#[must_use]
pub fn top_rated(shops: &[Shop], n: usize) -> Vec<&Shop> {
    let mut ranked: Vec<&Shop> = shops.iter().collect();
    ranked.sort_by(|a, b| SortBy::Rating.compare(a, b));
    ranked.truncate(n);
    ranked
}

/// The first `n` shops in source order.
#[must_use]
pub fn featured(shops: &[Shop], n: usize) -> Vec<&Shop> {
    shops.iter().take(n).collect()
}

/// Shops that have a map link, for the map page.
#[must_use]
pub fn with_map_links(shops: &[Shop]) -> Vec<Shop> {
    shops
        .iter()
        .filter(|s| !s.google_maps_url.is_empty())
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::normalize_shops;

    fn shops() -> Vec<Shop> {
        normalize_shops(&json!([
            { "reg_no": "A", "shop_name": "Lanka Pharmacy", "categories": "pharmacy",
              "services": "Prescriptions", "rating": 4.5, "review_count": 10,
              "shop_owner_name": "Sunil", "address": "Main St, Dompe",
              "google_maps_url": "https://maps.google.com/?q=Dompe" },
            { "reg_no": "B", "shop_name": "bakery corner", "categories": "bakery, restaurant",
              "services": "Cakes, Catering", "rating": 4.5, "review_count": 3 },
            { "reg_no": "C", "shop_name": "City Hardware", "categories": "hardware",
              "services": "Key cutting", "rating": "3.9", "review_count": "7" },
            { "reg_no": "D", "shop_name": "Apex Pharmacy", "categories": "Pharmacy, grocery",
              "services": "Home delivery", "rating": 4.8 }
        ]))
        .unwrap()
    }

    fn ids(list: &[&Shop]) -> Vec<String> {
        list.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_default_query_passes_everything_in_order() {
        let shops = shops();
        let out = filter_shops(&shops, &ListingQuery::default());
        assert_eq!(ids(&out), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_pharmacy_by_rating() {
        let shops = shops();
        let query = ListingQuery {
            search: "pharmacy",
            category: CategoryFilter::parse("pharmacy"),
            sort: Some(SortBy::Rating),
            fields: SearchField::PUBLIC,
        };
        assert_eq!(ids(&filter_shops(&shops, &query)), vec!["D", "A"]);
    }

    #[test]
    fn test_search_is_trimmed_and_case_insensitive() {
        let shops = shops();
        let query = ListingQuery {
            search: "  CATERING ",
            ..ListingQuery::default()
        };
        assert_eq!(ids(&filter_shops(&shops, &query)), vec!["B"]);

        let blank = ListingQuery {
            search: "   ",
            ..ListingQuery::default()
        };
        assert_eq!(filter_shops(&shops, &blank).len(), 4);
    }

    #[test]
    fn test_rating_sort_is_stable() {
        let shops = shops();
        let query = ListingQuery {
            sort: Some(SortBy::Rating),
            ..ListingQuery::default()
        };
        let out = filter_shops(&shops, &query);
        assert_eq!(ids(&out), vec!["D", "A", "B", "C"]);
        assert!(out.windows(2).all(|w| w[0].rating >= w[1].rating));
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let shops = shops();
        let query = ListingQuery {
            sort: Some(SortBy::Name),
            ..ListingQuery::default()
        };
        assert_eq!(
            ids(&filter_shops(&shops, &query)),
            vec!["D", "B", "C", "A"]
        );
    }

    #[test]
    fn test_category_filter_keeps_input_order() {
        let shops = normalize_shops(&json!([
            { "reg_no": "S1", "shop_name": "Perera Stores", "categories": "grocery" },
            { "reg_no": "S2", "shop_name": "Zenith Pharmacy", "categories": "pharmacy", "rating": 3.1 },
            { "reg_no": "S3", "shop_name": "Dompe Electronics", "categories": "electronics" },
            { "reg_no": "S4", "shop_name": "Apex Pharmacy", "categories": "Pharmacy", "rating": 4.9 },
            { "reg_no": "S5", "shop_name": "Lanka Textiles", "categories": "clothing" }
        ]))
        .unwrap();
        let query = ListingQuery {
            category: CategoryFilter::parse("pharmacy"),
            sort: None,
            ..ListingQuery::default()
        };
        assert_eq!(ids(&filter_shops(&shops, &query)), vec!["S2", "S4"]);
    }

    #[test]
    fn test_name_sort_is_stable_for_equal_names() {
        let shops = normalize_shops(&json!([
            { "reg_no": "X", "shop_name": "Kandy Stores" },
            { "reg_no": "Y", "shop_name": "Ambewela Dairy" },
            { "reg_no": "Z", "shop_name": "kandy stores" }
        ]))
        .unwrap();
        let query = ListingQuery {
            sort: Some(SortBy::Name),
            ..ListingQuery::default()
        };
        assert_eq!(ids(&filter_shops(&shops, &query)), vec!["Y", "X", "Z"]);

        let reversed: Vec<Shop> = shops.iter().rev().cloned().collect();
        assert_eq!(ids(&filter_shops(&reversed, &query)), vec!["Y", "Z", "X"]);
    }

    #[test]
    fn test_admin_fields_search_owner_and_reg_no() {
        let shops = shops();
        let by_owner = ListingQuery {
            search: "sunil",
            fields: SearchField::ADMIN,
            ..ListingQuery::default()
        };
        assert_eq!(ids(&filter_shops(&shops, &by_owner)), vec!["A"]);

        let by_services = ListingQuery {
            search: "cakes",
            fields: SearchField::ADMIN,
            ..ListingQuery::default()
        };
        assert!(filter_shops(&shops, &by_services).is_empty());
    }

    #[test]
    fn test_map_fields_search_address_and_categories() {
        let shops = shops();
        let query = ListingQuery {
            search: "dompe",
            fields: SearchField::MAP,
            ..ListingQuery::default()
        };
        assert_eq!(ids(&filter_shops(&shops, &query)), vec!["A"]);

        let query = ListingQuery {
            search: "hardware",
            fields: SearchField::MAP,
            ..ListingQuery::default()
        };
        assert_eq!(ids(&filter_shops(&shops, &query)), vec!["C"]);
    }

    #[test]
    fn test_parse_query_values() {
        assert_eq!(SortBy::parse("Name"), SortBy::Name);
        assert_eq!(SortBy::parse("anything"), SortBy::Rating);
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("ALL"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse(" Bakery"),
            CategoryFilter::Only("bakery".to_string())
        );
    }

    #[test]
    fn test_stats() {
        let stats = ShopStats::from_shops(&shops());
        assert_eq!(stats.total_shops, 4);
        assert_eq!(stats.total_reviews, 20);
        assert_eq!(stats.average_label(), "4.4");

        let empty = ShopStats::from_shops(&[]);
        assert_eq!(empty.average_rating, 0.0);
        assert_eq!(empty.average_label(), "0.0");
    }

    #[test]
    fn test_aggregates() {
        let shops = shops();
        let counts = category_counts(&shops);
        assert_eq!(counts.len(), CATEGORIES.len());
        let pharmacy = counts.iter().find(|(c, _)| c.id == "pharmacy").unwrap();
        assert_eq!(pharmacy.1, 2);

        assert_eq!(ids(&top_rated(&shops, 2)), vec!["D", "A"]);
        assert_eq!(ids(&featured(&shops, 3)), vec!["A", "B", "C"]);
        assert_eq!(featured(&shops, 10).len(), 4);

        let mapped = with_map_links(&shops);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].id, "A");
    }
}
