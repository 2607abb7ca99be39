//! Google Maps link handling for the map page.
//!
//! Shops store whatever link the owner pasted. The map page can only frame
//! embed URLs, so share links are converted where the link itself carries
//! enough to locate the shop.

use std::sync::LazyLock;

use regex::Regex;

static PLACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"place/([^/?#]+)").expect("Invalid regex"));

static AT_COORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").expect("Invalid regex"));

static Q_COORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]q=(-?\d+\.\d+),(-?\d+\.\d+)").expect("Invalid regex"));

const EMBED_BASE: &str = "https://www.google.com/maps/embed/v1";

/// Zoom level used for coordinate embeds.
const VIEW_ZOOM: u8 = 15;

/// Convert a Google Maps link into an embeddable URL.
///
/// Returns `None` for short links (`maps.app.goo.gl`, `goo.gl/maps`), which
/// hide the location behind a redirect, and for links with nothing to embed.
#[must_use]
pub fn embed_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    if url.contains("/embed") {
        return Some(url.to_string());
    }
    if url.contains("maps.app.goo.gl") || url.contains("goo.gl/maps") {
        return None;
    }

    if url.contains("/maps/place/")
        && let Some(name) = PLACE_RE.captures(url).and_then(|c| c.get(1))
    {
        let query: String = url::form_urlencoded::byte_serialize(name.as_str().as_bytes()).collect();
        return Some(format!("{EMBED_BASE}/place?key=&q={query}"));
    }

    AT_COORDS_RE
        .captures(url)
        .or_else(|| Q_COORDS_RE.captures(url))
        .and_then(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .map(|(lat, lng)| format!("{EMBED_BASE}/view?key=&center={lat},{lng}&zoom={VIEW_ZOOM}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_urls_pass_through() {
        let url = "https://www.google.com/maps/embed?pb=!1m18";
        assert_eq!(embed_url(url).as_deref(), Some(url));
    }

    #[test]
    fn test_short_links_have_no_embed() {
        assert_eq!(embed_url("https://maps.app.goo.gl/AbCdEf"), None);
        assert_eq!(embed_url("https://goo.gl/maps/xyz"), None);
        assert_eq!(embed_url(""), None);
    }

    #[test]
    fn test_place_links() {
        assert_eq!(
            embed_url("https://www.google.com/maps/place/Perera+Stores/@7.07,80.05,17z").as_deref(),
            Some("https://www.google.com/maps/embed/v1/place?key=&q=Perera%2BStores")
        );
    }

    #[test]
    fn test_coordinate_links() {
        assert_eq!(
            embed_url("https://www.google.com/maps/@7.0731,80.0540,15z").as_deref(),
            Some("https://www.google.com/maps/embed/v1/view?key=&center=7.0731,80.0540&zoom=15")
        );
        assert_eq!(
            embed_url("https://maps.google.com/?q=7.0731,-80.0540").as_deref(),
            Some("https://www.google.com/maps/embed/v1/view?key=&center=7.0731,-80.0540&zoom=15")
        );
    }

    #[test]
    fn test_unrecognised_links() {
        assert_eq!(embed_url("https://www.google.com/maps?q=Dompe"), None);
    }
}
