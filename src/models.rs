use serde::{Deserialize, Serialize};

/// Canonical product listing returned to the caller.
///
/// One record per provider result entry. `logo_url` is always derived from
/// the link host, never supplied by the provider. `product_id` is an
/// internal handle for the detail lookup and stays out of the response
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub title: Option<String>,
    pub link: String,
    pub image_link: Option<String>,
    pub price: Option<String>,
    pub source: String,
    pub logo_url: Option<String>,
    pub rating: f64,
    pub free_delivery: bool,
    #[serde(skip)]
    pub product_id: Option<String>,
}

/// Caller-supplied marketplace allow-list, scoped to a single request.
///
/// Empty or absent filters fall back to the default-market predicate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub marketplaces: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Image,
    Text,
}

/// One pipeline invocation's input.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub input: SearchInput,
    pub filters: SearchFilters,
}

#[derive(Debug, Clone)]
pub enum SearchInput {
    /// URL of a previously stored image, fetchable by the provider.
    Image { image_url: String },
    Text { query: String },
}

impl SearchRequest {
    pub fn mode(&self) -> SearchMode {
        match self.input {
            SearchInput::Image { .. } => SearchMode::Image,
            SearchInput::Text { .. } => SearchMode::Text,
        }
    }
}

/// Body of `POST /api/search/text`.
#[derive(Debug, Deserialize)]
pub struct TextSearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

/// Optional `data` part of the multipart image search request.
#[derive(Debug, Default, Deserialize)]
pub struct ImageSearchRequest {
    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
