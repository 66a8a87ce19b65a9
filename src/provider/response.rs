//! Typed shapes for the provider's JSON documents.
//!
//! The provider's schema drifts between verticals and over time, so every
//! field here is an explicitly optional lookup: a missing or wrong-typed
//! value deserializes to `None` (or an empty list) instead of failing the
//! whole document. Only the keys the pipeline actually reads are modeled.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Image-mode search response. The result array is absent when the provider
/// found nothing.
#[derive(Debug, Default, Deserialize)]
pub struct VisualSearchDocument {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub visual_matches: Vec<VisualMatch>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VisualMatch {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub image: Option<ImageRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
}

/// Text-mode search response.
#[derive(Debug, Default, Deserialize)]
pub struct ShoppingSearchDocument {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub shopping_results: Vec<ShoppingResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShoppingResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub seller: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delivery: Option<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_id: Option<String>,
}

/// Per-product detail response used by the enrichment lookup.
#[derive(Debug, Default, Deserialize)]
pub struct ProductDetailDocument {
    #[serde(default, deserialize_with = "lenient_object")]
    pub product_results: Option<ProductResults>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductResults {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
}

impl ProductDetailDocument {
    /// First usable full-resolution image, if the provider returned any.
    pub fn first_image(&self) -> Option<&str> {
        self.product_results
            .as_ref()?
            .media
            .iter()
            .find_map(|item| item.link.as_deref())
    }
}

/// Accepts a string, stringifies a bare number, treats anything else as
/// absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Prices arrive either as a display string or as an object carrying a
/// `value` string; both collapse to the display form.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(mut fields) => match fields.remove("value") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        },
        _ => None,
    })
}

/// Ratings arrive as a number or as a string, the latter sometimes being the
/// `"#"` placeholder; only values that read as a number survive.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// A nested object that fails to parse counts as absent.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Parses array items individually so one malformed entry does not take the
/// rest of the page down with it. A missing or non-array value yields an
/// empty list.
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn visual_document_without_matches_is_empty() {
        let document: VisualSearchDocument =
            serde_json::from_value(json!({ "search_metadata": { "status": "Success" } })).unwrap();
        assert!(document.visual_matches.is_empty());
    }

    #[test]
    fn wrong_typed_fields_read_as_absent() {
        let document: ShoppingSearchDocument = serde_json::from_value(json!({
            "shopping_results": [
                {
                    "title": 42,
                    "link": "https://shop.kz/item",
                    "seller": ["not", "a", "string"],
                    "rating": "#",
                    "delivery": { "price": "free" }
                }
            ]
        }))
        .unwrap();
        let entry = &document.shopping_results[0];
        assert_eq!(entry.title.as_deref(), Some("42"));
        assert_eq!(entry.link.as_deref(), Some("https://shop.kz/item"));
        assert!(entry.seller.is_none());
        assert!(entry.rating.is_none());
        assert!(entry.delivery.is_none());
    }

    #[test]
    fn price_object_collapses_to_display_value() {
        let document: VisualSearchDocument = serde_json::from_value(json!({
            "visual_matches": [
                { "link": "https://a.kz", "source": "a.kz", "price": { "value": "12 990 ₸", "extracted_value": 12990 } },
                { "link": "https://b.kz", "source": "b.kz", "price": "5 000 ₸" }
            ]
        }))
        .unwrap();
        assert_eq!(document.visual_matches[0].price.as_deref(), Some("12 990 ₸"));
        assert_eq!(document.visual_matches[1].price.as_deref(), Some("5 000 ₸"));
    }

    #[test]
    fn rating_accepts_number_and_numeric_string() {
        let document: ShoppingSearchDocument = serde_json::from_value(json!({
            "shopping_results": [
                { "rating": 4.4 },
                { "rating": "4.4" },
                { "rating": "#" }
            ]
        }))
        .unwrap();
        assert_eq!(document.shopping_results[0].rating, Some(4.4));
        assert_eq!(document.shopping_results[1].rating, Some(4.4));
        assert_eq!(document.shopping_results[2].rating, None);
    }

    #[test]
    fn malformed_entry_is_dropped_not_fatal() {
        let document: VisualSearchDocument = serde_json::from_value(json!({
            "visual_matches": [
                "not an object",
                { "link": "https://ok.kz", "source": "ok.kz" }
            ]
        }))
        .unwrap();
        assert_eq!(document.visual_matches.len(), 1);
        assert_eq!(document.visual_matches[0].link.as_deref(), Some("https://ok.kz"));
    }

    #[test]
    fn detail_document_surfaces_first_media_link() {
        let document: ProductDetailDocument = serde_json::from_value(json!({
            "product_results": {
                "media": [
                    { "type": "image" },
                    { "link": "https://cdn.example/full.jpg" }
                ]
            }
        }))
        .unwrap();
        assert_eq!(document.first_image(), Some("https://cdn.example/full.jpg"));

        let empty: ProductDetailDocument = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_image(), None);
    }
}
