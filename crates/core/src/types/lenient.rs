//! Serde helpers for spreadsheet-shaped JSON.
//!
//! Spreadsheet cells come back as strings, numbers or `null` depending on how
//! they were typed in, so text fields accept all three.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a JSON scalar as text. `null`, arrays and objects become empty.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Deserialize a string field that may arrive as a number or `null`.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(scalar_text).unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "text")]
        phone: String,
    }

    #[test]
    fn test_text_accepts_numbers_and_null() {
        let row: Row = serde_json::from_value(json!({ "phone": 771_234_567 })).unwrap();
        assert_eq!(row.phone, "771234567");

        let row: Row = serde_json::from_value(json!({ "phone": null })).unwrap();
        assert_eq!(row.phone, "");

        let row: Row = serde_json::from_value(json!({ "phone": " +94 77 " })).unwrap();
        assert_eq!(row.phone, "+94 77");

        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert_eq!(row.phone, "");
    }
}
