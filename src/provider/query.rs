use crate::config::SearchConfig;

/// Locale pinning for the text vertical: bias results toward the regional
/// storefront regardless of where the request originates.
const COUNTRY_CODE: &str = "kz";
const SEARCH_DOMAIN: &str = "google.kz";

/// Ordered provider query parameters. Built fresh per request, never
/// mutated after construction.
#[derive(Debug, Clone)]
pub struct ProviderQuery {
    params: Vec<(&'static str, String)>,
}

impl ProviderQuery {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            params: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, key: &'static str, value: &str) {
        self.params.push((key, value.to_string()));
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Parameters for a visual search against a stored image URL.
pub fn image_query(config: &SearchConfig, image_url: &str) -> ProviderQuery {
    let mut query = ProviderQuery::with_capacity(6);
    query.push("engine", &config.image_engine);
    query.push("search_type", &config.image_search_type);
    query.push("url", image_url);
    query.push("api_key", &config.api_key);
    query.push("country", &config.image_country);
    query.push("hl", &config.locale);
    query
}

/// Parameters for a free-text shopping search.
pub fn text_query(config: &SearchConfig, term: &str) -> ProviderQuery {
    let mut query = ProviderQuery::with_capacity(7);
    query.push("engine", &config.text_engine);
    query.push("api_key", &config.api_key);
    query.push("location", &config.text_location);
    query.push("hl", &config.locale);
    query.push("q", term);
    query.push("gl", COUNTRY_CODE);
    query.push("google_domain", SEARCH_DOMAIN);
    query
}

/// Parameters for the per-product detail lookup used by enrichment.
pub fn product_query(config: &SearchConfig, product_id: &str) -> ProviderQuery {
    let mut query = ProviderQuery::with_capacity(5);
    query.push("engine", &config.product_engine);
    query.push("product_id", product_id);
    query.push("api_key", &config.api_key);
    query.push("gl", COUNTRY_CODE);
    query.push("hl", &config.locale);
    query
}
