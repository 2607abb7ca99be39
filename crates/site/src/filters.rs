//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a rating with one decimal, or "New" for unrated shops.
///
/// Usage in templates: `{{ shop.rating|rating }}`
#[askama::filter_fn]
pub fn rating(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(rating_label(parse_rating(&value)))
}

/// Five-character star bar for a rating, e.g. `★★★★☆`.
///
/// Usage in templates: `{{ shop.rating|stars }}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_bar(parse_rating(&value)))
}

fn parse_rating(value: &impl Display) -> f64 {
    value.to_string().trim().parse().unwrap_or(0.0)
}

pub(crate) fn rating_label(rating: f64) -> String {
    if rating > 0.0 {
        format!("{rating:.1}")
    } else {
        "New".to_string()
    }
}

pub(crate) fn star_bar(rating: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let full = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}
