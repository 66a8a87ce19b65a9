use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::error;

use super::query::ProviderQuery;
use crate::pipeline::SearchError;

/// Issues one provider GET and maps the outcome onto the error taxonomy.
///
/// A 4xx status means the provider rejected our input and the body is
/// surfaced to the caller; 5xx and undecodable bodies are provider-side
/// faults; anything below HTTP is a transport failure.
pub async fn fetch<T>(http: &Client, base_url: &str, query: &ProviderQuery) -> Result<T, SearchError>
where
    T: DeserializeOwned,
{
    let response = http
        .get(base_url)
        .query(query.params())
        .send()
        .await
        .map_err(|err| SearchError::Transport(err.to_string()))?;

    let status = response.status();
    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        error!(
            target = "marketlens.provider",
            status = status.as_u16(),
            body = %body,
            "provider rejected request"
        );
        let detail = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body
        };
        return Err(SearchError::InvalidRequest(detail));
    }
    if status.is_server_error() {
        return Err(SearchError::ProviderUnavailable(format!("HTTP {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|err| SearchError::ProviderUnavailable(format!("undecodable response: {err}")))
}
