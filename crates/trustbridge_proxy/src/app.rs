use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use chrono::Utc;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub backend_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub backend_url: Url,
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            backend_url: config.backend_url.clone(),
        })
    }

    fn upstream(&self, path: &str, query: Option<&str>) -> Result<Url, url::ParseError> {
        let mut base = self.backend_url.clone();
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        let mut url = base.join(path.trim_start_matches('/'))?;
        url.set_query(query.filter(|query| !query.is_empty()));
        Ok(url)
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route(
            "/api/auth/login",
            post(login).fallback(method_not_allowed),
        )
        .route(
            "/api/transfer/initiate",
            post(initiate_transfer).fallback(method_not_allowed),
        )
        .route(
            "/api/transfer/invoice/{id}",
            get(download_invoice).fallback(method_not_allowed),
        )
        .route("/api/{*path}", any(forward_api))
        .with_state(state)
}

async fn health_live() -> impl IntoResponse {
    Json(json!({
        "status": "live",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.http.get(state.backend_url.clone()).send().await.is_ok();
    let payload = Json(json!({
        "status": if ready { "ready" } else { "degraded" },
        "backend": state.backend_url.as_str(),
        "timestamp": Utc::now().to_rfc3339()
    }));

    if ready {
        (StatusCode::OK, payload).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, payload).into_response()
    }
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    let upstream = Upstream {
        method: Method::POST,
        path: "api/auth/login",
        query: None,
        authorization: None,
        body: Some(body),
    };
    match upstream.send(&state).await {
        Ok(response) => relay(response).await,
        Err(err) => backend_failure("Failed to connect to backend", err),
    }
}

async fn initiate_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let upstream = Upstream {
        method: Method::POST,
        path: "api/transfer/initiate",
        query: None,
        authorization: authorization(&headers),
        body: Some(body),
    };
    match upstream.send(&state).await {
        Ok(response) => relay(response).await,
        Err(err) => backend_failure("Failed to initiate transfer", err),
    }
}

async fn download_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let path = format!("api/transfer/invoice/{id}");
    let upstream = Upstream {
        method: Method::GET,
        path: &path,
        query: None,
        authorization: authorization(&headers),
        body: None,
    };

    let response = match upstream.send(&state).await {
        Ok(response) => response,
        Err(err) => return backend_failure("Failed to download invoice", err),
    };
    if !response.status().is_success() {
        return (
            response.status(),
            Json(json!({ "error": "Failed to get invoice" })),
        )
            .into_response();
    }

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => return backend_failure("Failed to download invoice", err),
    };
    let disposition = format!("attachment; filename=\"Invoice-{id}.pdf\"");
    info!(transfer_id = %id, bytes = bytes.len(), "invoice relayed");
    (
        [
            (header::CONTENT_TYPE, mime::APPLICATION_PDF.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

async fn forward_api(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let carries_body = matches!(method, Method::POST | Method::PUT | Method::PATCH);
    let path = format!("api/{path}");
    let upstream = Upstream {
        method,
        path: &path,
        query: uri.query(),
        authorization: authorization(&headers),
        body: carries_body.then_some(body),
    };
    match upstream.send(&state).await {
        Ok(response) => relay(response).await,
        Err(err) => backend_failure("Failed to connect to backend", err),
    }
}

struct Upstream<'a> {
    method: Method,
    path: &'a str,
    query: Option<&'a str>,
    authorization: Option<HeaderValue>,
    body: Option<Bytes>,
}

impl Upstream<'_> {
    async fn send(self, state: &AppState) -> anyhow::Result<reqwest::Response> {
        let url = state.upstream(self.path, self.query)?;
        debug!(method = %self.method, url = %url, "forwarding to backend");

        let mut request = state
            .http
            .request(self.method, url)
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
        if let Some(value) = self.authorization {
            request = request.header(header::AUTHORIZATION, value);
        }
        if let Some(body) = self.body {
            request = request.body(body);
        }
        Ok(request.send().await?)
    }
}

fn authorization(headers: &HeaderMap) -> Option<HeaderValue> {
    headers.get(header::AUTHORIZATION).cloned()
}

/// Copies the upstream status, content type and body verbatim.
async fn relay(response: reqwest::Response) -> Response {
    let status = response.status();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => return backend_failure("Failed to connect to backend", err),
    };

    let mut reply = Response::new(Body::from(bytes));
    *reply.status_mut() = status;
    if let Some(content_type) = content_type {
        reply.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    reply
}

fn backend_failure(message: &str, err: impl Into<anyhow::Error>) -> Response {
    let err = err.into();
    error!(error = %err, "{message}");
    let body: Value = json!({
        "success": false,
        "error": message,
        "details": format!("{err:#}"),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
