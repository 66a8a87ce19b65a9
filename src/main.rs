mod config;
mod enrich;
mod filter;
mod http;
mod metrics;
mod models;
mod normalize;
mod pipeline;
mod provider;
mod storage;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::{
    ApiError, ImageSearchRequest, ProductRecord, SearchInput, SearchRequest, TextSearchRequest,
};
use pipeline::{Pipeline, SearchError};
use std::{net::SocketAddr, sync::Arc};
use storage::ImageStore;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "marketlens.api", "server crashed: {err}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let search_config = config::SearchConfig::from_env()?;
    let store = ImageStore::from_env()?;
    let pipeline = Pipeline::new(search_config);
    let openapi: serde_json::Value = serde_yaml::from_str(include_str!("../docs/openapi.yaml"))
        .unwrap_or(serde_json::json!({"openapi":"3.0.3"}));
    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;

    let state = AppState {
        pipeline,
        store: store.clone(),
        openapi: Arc::new(openapi),
        prometheus_handle,
    };

    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
        .route("/api/search/image", post(search_by_image))
        .route("/api/search/text", post(search_by_text))
        .nest_service("/uploads", ServeDir::new(store.upload_dir()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit_from_env()));

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "marketlens.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
    store: ImageStore,
    openapi: Arc<serde_json::Value>,
    prometheus_handle: PrometheusHandle,
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
/// - Auth: none
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "marketlens-api-rs",
    }))
}

async fn openapi_json(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json((*state.openapi).clone())
}

async fn swagger_ui() -> axum::http::Response<String> {
    let html = r#"<!doctype html>
<html>
<head>
  <meta charset='utf-8'/>
  <title>Marketlens API Docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: '/openapi.json', dom_id: '#swagger-ui' });
    };
  </script>
</body>
</html>"#;
    axum::http::Response::builder()
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.to_string())
        .unwrap()
}

async fn metrics_endpoint(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::http::Response<String> {
    if let Ok(secret) = std::env::var("METRICS_KEY") {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return axum::http::Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .body("unauthorized".into())
                .unwrap();
        }
    }
    let body = state.prometheus_handle.render();
    axum::http::Response::builder()
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .unwrap()
}

fn body_limit_from_env() -> usize {
    std::env::var("REQUEST_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(8 * 1024 * 1024)
}

/// Visual search over an uploaded image.
///
/// - Method: `POST`
/// - Path: `/api/search/image`
/// - Body: multipart with an `image` file part and an optional `data` JSON
///   part carrying marketplace filters
async fn search_by_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<ProductRecord>>, AppError> {
    crate::metrics::inc_requests("/api/search/image");

    let mut image: Option<(String, Vec<u8>)> = None;
    let mut request = ImageSearchRequest::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                image = Some((file_name, bytes.to_vec()));
            }
            Some("data") => {
                let raw = field.text().await.map_err(bad_multipart)?;
                request = serde_json::from_str(&raw).map_err(|err| {
                    AppError::from(SearchError::InvalidRequest(format!(
                        "malformed data part: {err}"
                    )))
                })?;
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = image else {
        return Err(SearchError::InvalidRequest("missing image part".to_string()).into());
    };
    let image_url = state.store.store(&file_name, &bytes).await?;
    info!(target = "marketlens.api", image_url = %image_url, "image stored for visual search");

    let stored_name = image_url.rsplit('/').next().unwrap_or_default().to_string();
    let result = state
        .pipeline
        .execute(SearchRequest {
            input: SearchInput::Image {
                image_url: image_url.clone(),
            },
            filters: request.filters.unwrap_or_default(),
        })
        .await;

    // The provider has fetched the image by now; keep the upload dir tidy.
    if !state.store.delete(&stored_name).await {
        warn!(target = "marketlens.api", image_url = %image_url, "stored image was already gone");
    }

    Ok(Json(result?))
}

/// Free-text shopping search.
///
/// - Method: `POST`
/// - Path: `/api/search/text`
/// - Body: `TextSearchRequest`
async fn search_by_text(
    State(state): State<AppState>,
    Json(payload): Json<TextSearchRequest>,
) -> Result<Json<Vec<ProductRecord>>, AppError> {
    crate::metrics::inc_requests("/api/search/text");

    let records = state
        .pipeline
        .execute(SearchRequest {
            input: SearchInput::Text {
                query: payload.query,
            },
            filters: payload.filters.unwrap_or_default(),
        })
        .await?;
    Ok(Json(records))
}

#[derive(Debug)]
enum AppError {
    Search(SearchError),
}

impl From<SearchError> for AppError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Search(SearchError::InvalidRequest(err.to_string()))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Search(err) = self;
        let status = match &err {
            SearchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SearchError::Configuration(_) | SearchError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SearchError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            SearchError::Transport(_) => StatusCode::GATEWAY_TIMEOUT,
        };
        let payload = ApiError {
            error: err.label().to_string(),
            detail: Some(err.to_string()),
        };
        (status, Json(payload)).into_response()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
