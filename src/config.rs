use std::env;
use std::time::Duration;

use crate::pipeline::SearchError;

/// Static pipeline configuration, read from the environment once at startup.
///
/// Every provider-facing value is required; construction fails on the first
/// missing key instead of deferring the error to first use.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub provider_base_url: String,
    pub api_key: String,
    /// Interface locale (`hl`), shared by both search verticals.
    pub locale: String,
    pub image_engine: String,
    pub image_search_type: String,
    pub image_country: String,
    pub text_engine: String,
    pub text_location: String,
    /// Engine for the per-product detail lookup in text mode.
    pub product_engine: String,
    /// Logo-service URL template with a `{host}` placeholder.
    pub logo_template: String,
    pub enrich_concurrency: usize,
    pub enrich_timeout: Duration,
}

impl SearchConfig {
    pub fn from_env() -> Result<Self, SearchError> {
        Ok(Self {
            provider_base_url: env_or("SEARCH_PROVIDER_URL", "https://serpapi.com/search"),
            api_key: required("APPLICATION_KEY")?,
            locale: required("SEARCH_HL")?,
            image_engine: required("IMAGE_SEARCH_ENGINE")?,
            image_search_type: required("IMAGE_SEARCH_TYPE")?,
            image_country: required("IMAGE_SEARCH_COUNTRY")?,
            text_engine: required("TEXT_SEARCH_ENGINE")?,
            text_location: required("TEXT_SEARCH_LOCATION")?,
            product_engine: env_or("PRODUCT_SEARCH_ENGINE", "google_product"),
            logo_template: required("LOGO_PARSER_URL")?,
            enrich_concurrency: parsed_or("ENRICH_CONCURRENCY", 8),
            enrich_timeout: Duration::from_secs(parsed_or("ENRICH_TIMEOUT_SECS", 10)),
        })
    }
}

fn required(key: &'static str) -> Result<String, SearchError> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SearchError::Configuration(format!("{key} is not set")))
}

fn env_or(key: &'static str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &'static str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl SearchConfig {
    pub fn for_tests(provider_base_url: &str) -> Self {
        Self {
            provider_base_url: provider_base_url.to_string(),
            api_key: "test-key".to_string(),
            locale: "ru".to_string(),
            image_engine: "google_lens".to_string(),
            image_search_type: "all".to_string(),
            image_country: "kz".to_string(),
            text_engine: "google_shopping".to_string(),
            text_location: "Kazakhstan".to_string(),
            product_engine: "google_product".to_string(),
            logo_template: "https://logo.example/{host}".to_string(),
            enrich_concurrency: 4,
            enrich_timeout: Duration::from_secs(2),
        }
    }
}
