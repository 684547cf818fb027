//! HTTP server implementation using Axum.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use azsw_core::{
    CacheEngine, Destination, DynFetcher, FetchOutcome, NotificationClick, Request, RequestMode,
    ResponseSource, SwError,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Upper bound on requests handled at once.
const MAX_IN_FLIGHT: usize = 256;

/// Response header naming where a proxied response came from.
pub const SOURCE_HEADER: &str = "x-sw-source";

/// Response headers not copied from cached or upstream responses.
const SKIPPED_RESPONSE_HEADERS: [&str; 4] =
    ["connection", "content-length", "transfer-encoding", "keep-alive"];

/// Application state shared across handlers.
pub struct AppState {
    pub engine: Arc<CacheEngine>,
    /// Used directly for requests the engine does not intercept.
    pub fetcher: DynFetcher,
}

/// Error body for the `/__sw` endpoints.
struct ApiError(SwError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Hook failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl From<SwError> for ApiError {
    fn from(err: SwError) -> Self {
        ApiError(err)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__sw/status", get(handle_status))
        .route("/__sw/push", post(handle_push))
        .route("/__sw/notification-click", post(handle_click))
        .route("/__sw/sync/:tag", post(handle_sync))
        .fallback(handle_proxy)
        .layer(cors)
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the proxy server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    engine: Arc<CacheEngine>,
    fetcher: DynFetcher,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let state = Arc::new(AppState { engine, fetcher });
    let app = router(state);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

async fn handle_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.status().await?))
}

async fn handle_push(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload = (!body.is_empty()).then_some(body.as_ref());
    Ok(Json(state.engine.handle_push(payload).await?))
}

async fn handle_click(
    State(state): State<Arc<AppState>>,
    Json(click): Json<NotificationClick>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.handle_notification_click(&click).await?))
}

async fn handle_sync(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> impl IntoResponse {
    Json(json!({ "tag": tag, "outcome": state.engine.handle_sync(&tag) }))
}

/// Translate an incoming HTTP request into an engine request against the
/// configured origin.
///
/// Only the path and query are taken from the request target, so the
/// configured origin's scheme and host always apply.
fn to_engine_request(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Request {
    let mut url = state.engine.config().scope.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());

    let mut request = Request::new(method, url);
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    if let Some(dest) = request.header("sec-fetch-dest").map(Destination::parse) {
        request = request.with_destination(dest);
    }
    if let Some(mode) = request.header("sec-fetch-mode").map(RequestMode::parse) {
        request = request.with_mode(mode);
    }
    request
}

fn to_http_response(response: azsw_core::Response, source: Option<ResponseSource>) -> Response {
    let Ok(status) = StatusCode::from_u16(response.status) else {
        warn!("Dropping response with invalid status {}", response.status);
        return StatusCode::BAD_GATEWAY.into_response();
    };

    let mut builder = axum::http::Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in &response.headers {
            if SKIPPED_RESPONSE_HEADERS
                .iter()
                .any(|skipped| name.eq_ignore_ascii_case(skipped))
            {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        if let Some(source) = source {
            headers.insert(SOURCE_HEADER, HeaderValue::from_static(source_label(source)));
        }
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn source_label(source: ResponseSource) -> &'static str {
    match source {
        ResponseSource::Network => "network",
        ResponseSource::Cache => "cache",
    }
}

/// Everything outside `/__sw` goes through the engine.
async fn handle_proxy(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = to_engine_request(&state, method, &uri, &headers);

    match state.engine.handle_fetch(&request).await {
        Ok(FetchOutcome::Served { response, source }) => to_http_response(response, Some(source)),
        Ok(FetchOutcome::Unavailable) => {
            debug!("Nothing available for {}", request.url);
            (StatusCode::GATEWAY_TIMEOUT, "Offline and not cached").into_response()
        }
        Ok(FetchOutcome::Bypassed) => pass_through(&state, &request).await,
        Err(e) => {
            warn!("Fetch for {} failed: {}", request.url, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// Forward a request the engine did not intercept.
///
/// Request bodies are not carried, so only bodiless methods are forwarded.
async fn pass_through(state: &AppState, request: &Request) -> Response {
    if request.method != Method::GET && request.method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            "Only GET and HEAD are proxied",
        )
            .into_response();
    }
    match state.fetcher.fetch(request).await {
        Ok(response) => to_http_response(response, None),
        Err(e) => {
            warn!("Pass-through for {} failed: {}", request.url, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}
