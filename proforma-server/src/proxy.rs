//! Same-origin proxy routes
//!
//! Both routes forward the request body as a stream to the backend and relay
//! the backend's status, body and content headers untouched. The only status
//! the proxy originates itself is 502 when the backend cannot be reached.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use reqwest::Client;
use tracing::{debug, warn};
use uuid::Uuid;

use proforma_core::adapters::http_api::{CONSOLIDATE_PATH, EXPORT_PATH};
use proforma_core::config::normalize_url;
use proforma_core::services::export::{DEFAULT_DISPOSITION, XLSX_CONTENT_TYPE};
use proforma_core::Error;

/// Shared, immutable proxy state
#[derive(Debug, Clone)]
pub struct ProxyState {
    client: Client,
    backend_url: String,
}

impl ProxyState {
    /// No timeout: consolidation can take minutes
    pub fn new(backend_url: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            backend_url: normalize_url(backend_url, "BACKEND_INTERNAL_URL")?,
        })
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }
}

/// Build the proxy router
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(CONSOLIDATE_PATH, post(proxy_consolidate))
        .route(EXPORT_PATH, post(proxy_export))
        .with_state(state)
}

async fn proxy_consolidate(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    match forward(&state, CONSOLIDATE_PATH, &headers, body).await {
        Ok(response) => relay(response, &[(CONTENT_TYPE, None)]),
        Err(response) => response,
    }
}

async fn proxy_export(State(state): State<ProxyState>, headers: HeaderMap, body: Body) -> Response {
    match forward(&state, EXPORT_PATH, &headers, body).await {
        Ok(response) => relay(
            response,
            &[
                (CONTENT_TYPE, Some(XLSX_CONTENT_TYPE)),
                (CONTENT_DISPOSITION, Some(DEFAULT_DISPOSITION)),
            ],
        ),
        Err(response) => response,
    }
}

/// POST the body to the backend with its content headers
async fn forward(
    state: &ProxyState,
    path: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<reqwest::Response, Response> {
    let request_id = Uuid::new_v4();
    let url = format!("{}{}", state.backend_url, path);
    debug!(%request_id, %url, "forwarding request");

    let mut request = state
        .client
        .post(&url)
        .body(reqwest::Body::wrap_stream(body.into_data_stream()));
    for name in [CONTENT_TYPE, CONTENT_LENGTH] {
        if let Some(value) = headers.get(&name) {
            request = request.header(name, value.clone());
        }
    }

    match request.send().await {
        Ok(response) => {
            debug!(%request_id, status = %response.status(), "backend responded");
            Ok(response)
        }
        Err(e) => {
            warn!(%request_id, %url, error = %e, "backend unreachable");
            Err((
                StatusCode::BAD_GATEWAY,
                format!("Backend unavailable: {}", e),
            )
                .into_response())
        }
    }
}

/// Stream the backend response back, keeping the listed headers.
///
/// A header missing from the backend response takes its default, if any.
fn relay(response: reqwest::Response, keep: &[(HeaderName, Option<&'static str>)]) -> Response {
    let status = response.status();
    let mut headers = HeaderMap::new();
    for (name, default) in keep {
        let value = response
            .headers()
            .get(name)
            .cloned()
            .or_else(|| default.map(HeaderValue::from_static));
        if let Some(value) = value {
            headers.insert(name.clone(), value);
        }
    }

    (status, headers, Body::from_stream(response.bytes_stream())).into_response()
}
