//! Shop listing and backend health commands.

use dompee_core::listing::category_counts;
use dompee_core::{CategoryFilter, ListingQuery, SearchField, Shop, ShopStats, SortBy, filter_shops};
use dompee_site::backend::BackendClient;

use super::{CliError, fit};

/// Print shops matching the public list's search, category and sort.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or its reply is
/// malformed.
pub async fn list(
    client: &BackendClient,
    search: &str,
    category: &str,
    sort: &str,
) -> Result<(), CliError> {
    let shops = client.get_shops().await?;
    let query = ListingQuery {
        search,
        category: CategoryFilter::parse(category),
        sort: Some(SortBy::parse(sort)),
        fields: SearchField::PUBLIC,
    };
    let matched = filter_shops(&shops, &query);

    tracing::info!(total = shops.len(), matched = matched.len(), "Fetched shops");
    print_lines(&shop_table(&matched));
    Ok(())
}

/// Fetch shops and report totals.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or does not answer
/// with a list of shop records.
pub async fn check(client: &BackendClient) -> Result<(), CliError> {
    let shops = client.get_shops().await?;
    let stats = ShopStats::from_shops(&shops);

    let mut lines = vec![
        format!("shops:          {}", stats.total_shops),
        format!("reviews:        {}", stats.total_reviews),
        format!("average rating: {}", stats.average_label()),
        String::new(),
    ];
    for (category, count) in category_counts(&shops) {
        lines.push(format!("{:<14}  {count}", category.name));
    }
    let uncategorized = shops.iter().filter(|s| s.categories.is_empty()).count();
    if uncategorized > 0 {
        tracing::warn!(uncategorized, "Shops without a category");
    }

    print_lines(&lines);
    Ok(())
}

/// Fixed-width table of shops, header first.
pub(crate) fn shop_table(shops: &[&Shop]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<14}  {:<28}  {:<20}  {:>6}  {:>7}",
        "REG NO", "NAME", "OWNER", "RATING", "REVIEWS"
    )];
    lines.extend(shops.iter().map(|shop| {
        format!(
            "{:<14}  {:<28}  {:<20}  {:>6.1}  {:>7}",
            fit(&shop.reg_no, 14),
            fit(&shop.shop_name, 28),
            fit(&shop.shop_owner_name, 20),
            shop.rating,
            shop.review_count,
        )
    }));
    lines
}

#[allow(clippy::print_stdout)]
fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use dompee_core::normalize_shop;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_shop_table_rows() {
        let shop = normalize_shop(
            &json!({
                "registration_no": "DMP-2025-4821",
                "shop_name": "Perera Stores",
                "owner_name": "K. Perera",
                "rating": "4.25",
                "review_count": 12,
            }),
            0,
        )
        .unwrap();

        let lines = shop_table(&[&shop]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("REG NO"));
        assert!(lines[1].starts_with("DMP-2025-4821"));
        assert!(lines[1].contains("Perera Stores"));
        assert!(lines[1].trim_end().ends_with("12"));
    }
}
