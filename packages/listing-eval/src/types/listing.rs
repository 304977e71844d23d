//! Listing records as supplied by the listing source.

use serde::{Deserialize, Deserializer, Serialize};

/// A rental listing.
///
/// Only `id` and `photos` matter to scoring; the rest is carried through for
/// display. The four score fields are filled in on the copy returned for a
/// passing listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub url: String,

    pub source: Option<String>,
    pub address: Option<String>,
    pub address_normalized: Option<String>,
    pub price: Option<i64>,
    pub beds: Option<i64>,
    pub baths: Option<f64>,
    pub property_type: Option<String>,
    pub available_date: Option<String>,

    /// Serialized JSON array of photo URLs. Listing files may carry a plain
    /// array; it is normalised to the string form on load.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub photos: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub room_scores: Option<String>,
    #[serde(default)]
    pub avg_score: Option<f64>,
    #[serde(default)]
    pub listing_pass: Option<i64>,
    #[serde(default)]
    pub llm_reasoning: Option<String>,
}

impl Listing {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set photos from a list of URLs.
    pub fn with_photos<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        self.photos = serde_json::to_string(&urls).ok();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Photo URLs in listing order.
    ///
    /// Missing, malformed, or non-array `photos` yields an empty list.
    /// Non-string array entries are ignored.
    pub fn photo_urls(&self) -> Vec<String> {
        let Some(raw) = self.photos.as_deref() else {
            return Vec::new();
        };
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Short label for logs and summaries.
    pub fn display_name(&self) -> &str {
        match self.address.as_deref() {
            Some(address) if !address.is_empty() => address,
            _ => &self.url,
        }
    }
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_urls_from_serialized_array() {
        let listing = Listing::new(1, "https://example.com/1")
            .with_photos(["https://img/a.jpg", "https://img/b.jpg"]);
        assert_eq!(
            listing.photo_urls(),
            vec!["https://img/a.jpg".to_string(), "https://img/b.jpg".to_string()]
        );
    }

    #[test]
    fn test_malformed_photos_degrade_to_empty() {
        let mut listing = Listing::new(1, "u");
        assert!(listing.photo_urls().is_empty());

        listing.photos = Some("not json".into());
        assert!(listing.photo_urls().is_empty());

        listing.photos = Some(r#"{"a": 1}"#.into());
        assert!(listing.photo_urls().is_empty());

        listing.photos = Some(r#"["https://img/a.jpg", 3, null, ""]"#.into());
        assert_eq!(listing.photo_urls(), vec!["https://img/a.jpg".to_string()]);
    }

    #[test]
    fn test_deserialize_accepts_array_or_string_photos() {
        let from_array: Listing = serde_json::from_str(
            r#"{"id": 4, "url": "https://example.com/4", "photos": ["https://img/a.jpg"]}"#,
        )
        .unwrap();
        assert_eq!(from_array.photo_urls(), vec!["https://img/a.jpg".to_string()]);

        let from_string: Listing = serde_json::from_str(
            r#"{"url": "https://example.com/5", "photos": "[\"https://img/b.jpg\"]"}"#,
        )
        .unwrap();
        assert_eq!(from_string.photo_urls(), vec!["https://img/b.jpg".to_string()]);

        let without: Listing = serde_json::from_str(r#"{"url": "https://example.com/6"}"#).unwrap();
        assert!(without.photos.is_none());
    }
}
