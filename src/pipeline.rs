use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::SearchConfig;
use crate::http::build_client;
use crate::models::{ProductRecord, SearchInput, SearchRequest};
use crate::provider::response::{ShoppingSearchDocument, VisualSearchDocument};
use crate::provider::{client, query};
use crate::{enrich, filter, normalize};

/// Request-fatal failures. Per-record degradations (malformed links,
/// enrichment timeouts) are absorbed inside the enrichment stage and never
/// reach this taxonomy.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("image upload failed: {0}")]
    Upload(String),
    #[error("provider rejected the request: {0}")]
    InvalidRequest(String),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl SearchError {
    pub fn label(&self) -> &'static str {
        match self {
            SearchError::Configuration(_) => "configuration",
            SearchError::Upload(_) => "upload",
            SearchError::InvalidRequest(_) => "invalid_request",
            SearchError::ProviderUnavailable(_) => "provider_unavailable",
            SearchError::Transport(_) => "transport",
        }
    }
}

/// Sequences query building, the provider call, normalization, enrichment
/// and filtering for one request.
///
/// The batch either fails while building/querying or runs to completion;
/// the later stages degrade individual records instead of aborting. Retry
/// policy is a caller concern.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<SearchConfig>,
    http: Client,
}

impl Pipeline {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: build_client(),
        }
    }

    pub async fn execute(&self, request: SearchRequest) -> Result<Vec<ProductRecord>, SearchError> {
        let mode = request.mode();
        let config = &self.config;

        let started = Instant::now();
        let records = match &request.input {
            SearchInput::Image { image_url } => {
                let q = query::image_query(config, image_url);
                let document: VisualSearchDocument =
                    client::fetch(&self.http, &config.provider_base_url, &q).await?;
                normalize::normalize_visual(document)
            }
            SearchInput::Text { query: term } => {
                let q = query::text_query(config, term);
                let document: ShoppingSearchDocument =
                    client::fetch(&self.http, &config.provider_base_url, &q).await?;
                normalize::normalize_shopping(document)
            }
        };
        crate::metrics::stage_elapsed("query_and_normalize", started.elapsed().as_millis());

        let started = Instant::now();
        let normalized = records.len();
        let records = enrich::enrich_all(&self.http, config, records, mode).await;
        crate::metrics::stage_elapsed("enrich", started.elapsed().as_millis());

        let policy = filter::FilterPolicy::from_filters(&request.filters);
        let records = filter::apply(records, &policy);
        info!(
            target = "marketlens.pipeline",
            mode = ?mode,
            normalized,
            kept = records.len(),
            "search completed"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchFilters;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_request(query: &str, marketplaces: &[&str]) -> SearchRequest {
        SearchRequest {
            input: SearchInput::Text {
                query: query.to_string(),
            },
            filters: SearchFilters {
                marketplaces: marketplaces.iter().map(|m| m.to_string()).collect(),
            },
        }
    }

    fn pipeline_for(server: &MockServer) -> Pipeline {
        Pipeline::new(SearchConfig::for_tests(&server.uri()))
    }

    #[tokio::test]
    async fn server_error_aborts_without_partial_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = pipeline_for(&server)
            .execute(text_request("phone", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn client_error_surfaces_as_invalid_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Missing query `q` parameter"))
            .mount(&server)
            .await;

        let err = pipeline_for(&server)
            .execute(text_request("phone", &[]))
            .await
            .unwrap_err();
        match err {
            SearchError::InvalidRequest(detail) => assert!(detail.contains("Missing query")),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_provider_document_yields_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "search_information": { "shopping_results_state": "Empty" }
            })))
            .mount(&server)
            .await;

        let records = pipeline_for(&server)
            .execute(text_request("phone", &[]))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn text_search_normalizes_enriches_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google_shopping"))
            .and(query_param("q", "наушники"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "shopping_results": [
                    {
                        "title": "Наушники A",
                        "link": "https://kaspi.kz/shop/p/a",
                        "seller": "Kaspi.kz",
                        "price": "12 990 ₸",
                        "rating": 4.6,
                        "delivery": "Бесплатная доставка"
                    },
                    {
                        "title": "Наушники B",
                        "link": "https://ozon.kz/product/b",
                        "seller": "ozon.kz",
                        "thumbnail": "https://thumbs.example/b.jpg"
                    },
                    {
                        "title": "Headphones C",
                        "link": "https://amazon.com/dp/c",
                        "seller": "amazon.com"
                    },
                    {
                        "title": "Dropped",
                        "link": "#",
                        "seller": "kaspi.kz"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let records = pipeline_for(&server)
            .execute(text_request("наушники", &["kaspi", "OZON"]))
            .await
            .unwrap();

        let sources: Vec<_> = records.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["Kaspi.kz", "ozon.kz"]);
        assert_eq!(
            records[0].logo_url.as_deref(),
            Some("https://logo.example/kaspi.kz")
        );
        assert!(records[0].free_delivery);
        assert_eq!(records[0].rating, 4.6);
        assert_eq!(
            records[1].image_link.as_deref(),
            Some("https://thumbs.example/b.jpg")
        );
    }

    #[tokio::test]
    async fn image_search_reads_visual_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google_lens"))
            .and(query_param("url", "https://host.example/uploads/x.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "visual_matches": [
                    {
                        "title": "Кроссовки",
                        "link": "https://kaspi.kz/shop/p/x",
                        "source": "Kaspi.kz",
                        "image": { "link": "https://cdn.kaspi.kz/x.jpg" }
                    },
                    {
                        "title": "Sneakers",
                        "link": "https://ebay.com/itm/x",
                        "source": "ebay.com"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let records = pipeline_for(&server)
            .execute(SearchRequest {
                input: SearchInput::Image {
                    image_url: "https://host.example/uploads/x.jpg".to_string(),
                },
                filters: SearchFilters::default(),
            })
            .await
            .unwrap();

        // Default market filter keeps only the .kz source.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "Kaspi.kz");
        assert_eq!(
            records[0].image_link.as_deref(),
            Some("https://cdn.kaspi.kz/x.jpg")
        );
        assert_eq!(
            records[0].logo_url.as_deref(),
            Some("https://logo.example/kaspi.kz")
        );
    }
}
