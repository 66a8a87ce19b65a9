//! Maps provider documents into canonical [`ProductRecord`]s.
//!
//! Normalization is best-effort per entry: optional fields fall back to
//! their defaults, while entries without a usable destination or source are
//! dropped silently. Provider order is preserved and nothing is deduplicated.

use crate::models::ProductRecord;
use crate::provider::response::{ShoppingSearchDocument, VisualSearchDocument};

/// Provider placeholder for "no real destination".
const LINK_SENTINEL: &str = "#";

/// The provider's localized marker for free delivery on shopping results.
const FREE_DELIVERY_MARKER: &str = "Бесплатная доставка";

pub fn normalize_visual(document: VisualSearchDocument) -> Vec<ProductRecord> {
    document
        .visual_matches
        .into_iter()
        .filter_map(|entry| {
            let link = usable_link(entry.link)?;
            let source = entry.source?;
            Some(ProductRecord {
                title: entry.title,
                link,
                image_link: entry.image.and_then(|image| image.link),
                price: entry.price,
                source,
                logo_url: None,
                rating: 0.0,
                free_delivery: false,
                product_id: None,
            })
        })
        .collect()
}

pub fn normalize_shopping(document: ShoppingSearchDocument) -> Vec<ProductRecord> {
    document
        .shopping_results
        .into_iter()
        .filter_map(|entry| {
            let link = usable_link(entry.link)?;
            let source = entry.seller?;
            let free_delivery = entry.delivery.as_deref() == Some(FREE_DELIVERY_MARKER);
            Some(ProductRecord {
                title: entry.title,
                link,
                image_link: entry.thumbnail,
                price: entry.price,
                source,
                logo_url: None,
                rating: entry.rating.unwrap_or(0.0),
                free_delivery,
                product_id: entry.product_id,
            })
        })
        .collect()
}

fn usable_link(link: Option<String>) -> Option<String> {
    link.filter(|value| value != LINK_SENTINEL)
}
