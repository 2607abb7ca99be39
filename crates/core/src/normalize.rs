//! Normalization of backend shop records.
//!
//! The spreadsheet backend returns loosely-typed JSON whose column names drift
//! between deployments (`reg_no` vs `registration_no`, `phone` vs
//! `phone_number`, ...). Everything downstream works on [`Shop`], so the
//! mapping happens here, in one place, driven by [`aliases`].
//!
//! Lookups follow JavaScript `||` semantics: a missing key, `null` and an
//! empty (or all-whitespace) string all mean "try the next alias".

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::lenient::scalar_text;
use crate::types::{PLACEHOLDER_IMAGE, Shop};

/// Field alias table, primary name first.
pub mod aliases {
    pub const REG_NO: &[&str] = &["registration_no", "reg_no"];
    pub const SHOP_NAME: &[&str] = &["shop_name"];
    pub const OWNER_NAME: &[&str] = &["shop_owner_name", "owner_name"];
    pub const PHONE: &[&str] = &["phone_number", "phone"];
    pub const WHATSAPP: &[&str] = &["whatsapp_number", "whatsapp"];
    pub const ADDRESS: &[&str] = &["address"];
    pub const MAPS_URL: &[&str] = &["google_maps_url", "Google Maps URL", "map_url", "map_link"];
    pub const YOUTUBE: &[&str] = &["youtube_link"];
    pub const IMAGE: &[&str] = &["image", "image_url"];
    pub const CREATED_AT: &[&str] = &["created_at", "timestamp"];
    pub const RATING: &[&str] = &["rating"];
    pub const REVIEW_COUNT: &[&str] = &["review_count"];
    pub const CATEGORIES: &[&str] = &["categories"];
    pub const SERVICES: &[&str] = &["services"];
}

/// Name given to shops whose record has none.
pub const UNTITLED_SHOP: &str = "Untitled Shop";

/// Reasons a backend payload cannot be turned into shops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The shop list response was not a JSON array.
    #[error("expected a list of shops, got {0}")]
    NotAList(&'static str),
    /// A shop record was not a JSON object.
    #[error("shop record {index} is {kind}, not an object")]
    NotAnObject {
        /// Position in the list.
        index: usize,
        /// JSON type that was found.
        kind: &'static str,
    },
}

/// Normalize a whole `getShops` response.
///
/// Fails closed: one malformed element rejects the whole list rather than
/// rendering a partial one.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the payload is not an array of objects.
pub fn normalize_shops(payload: &Value) -> Result<Vec<Shop>, NormalizeError> {
    let items = payload
        .as_array()
        .ok_or_else(|| NormalizeError::NotAList(json_kind(payload)))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_shop(item, index))
        .collect()
}

/// Normalize one shop record. `index` is its position in the list and only
/// feeds the placeholder id of shops without a registration number.
///
/// # Errors
///
/// Returns [`NormalizeError::NotAnObject`] if `record` is not a JSON object.
pub fn normalize_shop(record: &Value, index: usize) -> Result<Shop, NormalizeError> {
    let obj = record.as_object().ok_or(NormalizeError::NotAnObject {
        index,
        kind: json_kind(record),
    })?;

    let reg_no = text(obj, aliases::REG_NO).unwrap_or_default();
    let id = if reg_no.is_empty() {
        format!("shop-{index}")
    } else {
        reg_no.clone()
    };

    let image = text(obj, aliases::IMAGE)
        .map(|url| drive_direct_link(&url))
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    Ok(Shop {
        id,
        reg_no,
        shop_name: text(obj, aliases::SHOP_NAME).unwrap_or_else(|| UNTITLED_SHOP.to_string()),
        shop_owner_name: text(obj, aliases::OWNER_NAME).unwrap_or_default(),
        phone_number: text(obj, aliases::PHONE).unwrap_or_default(),
        whatsapp_number: text(obj, aliases::WHATSAPP).unwrap_or_default(),
        address: text(obj, aliases::ADDRESS).unwrap_or_default(),
        services: token_list(field(obj, aliases::SERVICES), false),
        google_maps_url: text(obj, aliases::MAPS_URL).unwrap_or_default(),
        youtube_link: text(obj, aliases::YOUTUBE),
        image,
        categories: token_list(field(obj, aliases::CATEGORIES), true),
        rating: field(obj, aliases::RATING).map_or(0.0, rating),
        review_count: field(obj, aliases::REVIEW_COUNT).map_or(0, count),
        created_at: text(obj, aliases::CREATED_AT).unwrap_or_default(),
    })
}

/// Split a comma-joined list (or pass an array through) into trimmed,
/// non-empty tokens, lower-casing them when `lowercase` is set.
#[must_use]
pub fn token_list(value: Option<&Value>, lowercase: bool) -> Vec<String> {
    let tidy = |token: &str| {
        let token = token.trim();
        if lowercase {
            token.to_lowercase()
        } else {
            token.to_string()
        }
    };

    match value {
        Some(Value::String(s)) => s
            .split(',')
            .map(tidy)
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| tidy(&scalar_text(item)))
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Rewrite a Google Drive share link into a direct image URL.
///
/// The file id is the path segment between `/d/` and the next `/`. Links
/// that are not Drive links, or have no such segment, pass through unchanged.
///
/// ```
/// use dompee_core::normalize::drive_direct_link;
///
/// assert_eq!(
///     drive_direct_link("https://drive.google.com/file/d/1AbC_x-9/view?usp=sharing"),
///     "https://lh3.googleusercontent.com/d/1AbC_x-9"
/// );
/// assert_eq!(drive_direct_link("https://cdn.example/a.jpg"), "https://cdn.example/a.jpg");
/// ```
#[must_use]
pub fn drive_direct_link(url: &str) -> String {
    if !url.contains("drive.google.com") {
        return url.to_string();
    }
    url.split_once("/d/")
        .and_then(|(_, rest)| rest.split_once('/'))
        .map(|(file_id, _)| file_id)
        .filter(|file_id| !file_id.is_empty())
        .map_or_else(
            || url.to_string(),
            |file_id| format!("https://lh3.googleusercontent.com/d/{file_id}"),
        )
}

/// Coerce a rating cell to a finite number, 0 when absent or invalid.
#[must_use]
pub fn rating(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    };
    parsed.filter(|r| r.is_finite()).unwrap_or(0.0)
}

/// Coerce a count cell to a non-negative integer, 0 when absent or invalid.
#[must_use]
pub fn count(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        }
        _ => None,
    };
    parsed.map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// First alias whose value is non-empty text.
fn text(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .map(scalar_text)
        .find(|s| !s.is_empty())
}

/// First alias present with a non-null value.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

/// `parseFloat`-style parse: the longest leading decimal number.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '-' | '+' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    s.get(..end).and_then(|prefix| prefix.parse().ok())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
