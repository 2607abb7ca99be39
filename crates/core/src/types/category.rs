//! The fixed shop category catalogue.

/// A shop category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Category {
    /// Lower-case identifier stored in a shop's `categories`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Icon name used by the templates.
    pub icon: &'static str,
}

/// Every category a shop can be listed under.
pub const CATEGORIES: [Category; 12] = [
    Category { id: "grocery", name: "Grocery", icon: "shopping-cart" },
    Category { id: "electronics", name: "Electronics", icon: "smartphone" },
    Category { id: "clothing", name: "Clothing", icon: "shirt" },
    Category { id: "pharmacy", name: "Pharmacy", icon: "pill" },
    Category { id: "restaurant", name: "Restaurant", icon: "utensils" },
    Category { id: "hardware", name: "Hardware", icon: "wrench" },
    Category { id: "bakery", name: "Bakery", icon: "croissant" },
    Category { id: "salon", name: "Salon", icon: "scissors" },
    Category { id: "automotive", name: "Automotive", icon: "car" },
    Category { id: "jewelry", name: "Jewelry", icon: "gem" },
    Category { id: "services", name: "Services", icon: "briefcase" },
    Category { id: "other", name: "Other", icon: "store" },
];

impl Category {
    /// Look up a category by id, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static Self> {
        let id = id.trim();
        CATEGORIES.iter().find(|c| c.id.eq_ignore_ascii_case(id))
    }

    /// Display label for a category id, falling back to the raw id.
    #[must_use]
    pub fn label(id: &str) -> String {
        Self::find(id).map_or_else(|| id.to_string(), |c| c.name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalogue_ids_are_unique_and_lower_case() {
        let ids: HashSet<_> = CATEGORIES.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), CATEGORIES.len());
        assert!(CATEGORIES.iter().all(|c| c.id == c.id.to_lowercase()));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(Category::find(" Pharmacy ").map(|c| c.name), Some("Pharmacy"));
        assert!(Category::find("florist").is_none());
    }

    #[test]
    fn test_label_falls_back_to_id() {
        assert_eq!(Category::label("bakery"), "Bakery");
        assert_eq!(Category::label("florist"), "florist");
    }
}
