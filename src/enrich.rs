//! Per-record enrichment: derived logo URLs and, in text mode, optional
//! full-resolution images from the provider's per-product endpoint.
//!
//! Enrichment never drops a record. Every failure path degrades the affected
//! field, logs the record context, and lets the record through unchanged
//! otherwise.

use futures::stream::{self, StreamExt};
use reqwest::{Client, Url};
use tokio::time::timeout;
use tracing::warn;

use crate::config::SearchConfig;
use crate::models::{ProductRecord, SearchMode};
use crate::pipeline::SearchError;
use crate::provider::response::ProductDetailDocument;
use crate::provider::{client, query};

/// Enriches every record as an independent unit of work.
///
/// Fan-out is bounded by `enrich_concurrency`; results join back in the
/// original normalization order regardless of completion order.
pub async fn enrich_all(
    http: &Client,
    config: &SearchConfig,
    records: Vec<ProductRecord>,
    mode: SearchMode,
) -> Vec<ProductRecord> {
    let width = config.enrich_concurrency.max(1);
    stream::iter(
        records
            .into_iter()
            .map(|record| enrich_record(http, config, record, mode)),
    )
    .buffered(width)
    .collect()
    .await
}

async fn enrich_record(
    http: &Client,
    config: &SearchConfig,
    mut record: ProductRecord,
    mode: SearchMode,
) -> ProductRecord {
    record.logo_url = resolve_logo(&config.logo_template, &record.link);

    if mode == SearchMode::Text
        && let Some(product_id) = record.product_id.clone()
    {
        match timeout(
            config.enrich_timeout,
            fetch_full_image(http, config, &product_id),
        )
        .await
        {
            Ok(Ok(Some(image))) => record.image_link = Some(image),
            Ok(Ok(None)) => {}
            Ok(Err(err)) => {
                warn!(
                    target = "marketlens.enrich",
                    product_id = %product_id,
                    link = %record.link,
                    error = %err,
                    "detail lookup failed, keeping thumbnail"
                );
            }
            Err(_) => {
                warn!(
                    target = "marketlens.enrich",
                    product_id = %product_id,
                    link = %record.link,
                    timeout_ms = config.enrich_timeout.as_millis() as u64,
                    "detail lookup timed out, keeping thumbnail"
                );
            }
        }
    }

    record
}

/// Formats the logo-service URL for the record's link host.
///
/// No request is issued and the logo's existence is not verified. An
/// unparsable link leaves the logo unset; the record survives.
fn resolve_logo(template: &str, link: &str) -> Option<String> {
    match Url::parse(link) {
        Ok(url) => url.host_str().map(|host| template.replace("{host}", host)),
        Err(_) => {
            warn!(target = "marketlens.enrich", link = %link, "record link is malformed, skipping logo");
            None
        }
    }
}

async fn fetch_full_image(
    http: &Client,
    config: &SearchConfig,
    product_id: &str,
) -> Result<Option<String>, SearchError> {
    let q = query::product_query(config, product_id);
    let document: ProductDetailDocument =
        client::fetch(http, &config.provider_base_url, &q).await?;
    Ok(document.first_image().map(str::to_string))
}
