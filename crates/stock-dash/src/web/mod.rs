//! HTTP front end: the dashboard page plus a small JSON API.
//!
//! Routes:
//! - `GET /` dashboard page
//! - `GET /api/health`
//! - `GET /api/lookup?symbol=&exchange=&start=&end=&interval=`
//! - `GET /api/watchlist`, `POST /api/watchlist`, `DELETE /api/watchlist/:symbol`
//!
//! The browser session travels in the `x-session-id` header. A missing or
//! unknown id gets a fresh session, returned in the same header.

pub mod page;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::dashboard::Dashboard;
use crate::error::{DashboardError, Result};
use crate::market::{Exchange, Interval, LookupRequest, normalize_symbol};
use crate::session::{DashboardSession, SessionStore};

pub use page::PageRenderer;

/// Header carrying the browser session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared server state
#[derive(Debug)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub sessions: SessionStore,
    page: PageRenderer,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Result<Self> {
        let sessions = SessionStore::new(dashboard.config().session_ttl);
        Ok(Self {
            dashboard,
            sessions,
            page: PageRenderer::new()?,
        })
    }
}

/// Build the router with CORS, request tracing and shared state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/lookup", get(lookup))
        .route("/api/watchlist", get(watchlist).post(watch))
        .route("/api/watchlist/:symbol", delete(unwatch))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves, sweeping idle sessions in the background
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Dashboard listening");

    let sessions = state.sessions.clone();
    let sweep_every = state
        .dashboard
        .config()
        .session_ttl
        .max(Duration::from_secs(1));
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                tracing::debug!(removed, "Dropped idle sessions");
            }
        }
    });

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    sweeper.abort();
    result
}

/// Error response: status from the error variant, message as JSON
#[derive(Debug)]
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::InvalidInput(_) | DashboardError::InvalidSymbol(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::DataUnavailable { .. } => StatusCode::NOT_FOUND,
            DashboardError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            DashboardError::NetworkError(_)
            | DashboardError::YahooFinanceError(_)
            | DashboardError::NewsApiError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// JSON response tagged with the session id
fn with_session(session: &DashboardSession, body: impl Serialize) -> Response {
    let mut response = Json(body).into_response();
    if let Ok(value) = HeaderValue::from_str(&session.id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    response
}

async fn index(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let html = state
        .page
        .render(state.dashboard.config(), Utc::now().date_naive())?;
    Ok(Html(html))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.active_count(),
        server_time: Utc::now().timestamp_millis(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct LookupParams {
    symbol: Option<String>,
    exchange: Option<Exchange>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    interval: Option<Interval>,
}

impl LookupParams {
    fn into_request(self, default_exchange: Exchange) -> LookupRequest {
        LookupRequest {
            symbol: self.symbol.unwrap_or_default(),
            exchange: self.exchange.unwrap_or(default_exchange),
            start: self.start,
            end: self.end,
            interval: self.interval.unwrap_or_default(),
        }
    }
}

async fn lookup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<LookupParams>,
) -> ApiResult<Response> {
    let request = params.into_request(state.dashboard.config().default_exchange);
    tracing::debug!(?request, "Lookup request");

    let session = state.sessions.get_or_create(session_id(&headers))?;

    let view = state.dashboard.lookup(&request, &session).await;
    Ok(with_session(&session, view))
}

#[derive(Debug, Serialize)]
struct WatchlistResponse {
    symbols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    changed: Option<bool>,
}

impl WatchlistResponse {
    fn new(session: &DashboardSession, changed: Option<bool>) -> Self {
        Self {
            symbols: session.watchlist.iter().map(str::to_string).collect(),
            changed,
        }
    }
}

async fn watchlist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let session = state.sessions.get_or_create(session_id(&headers))?;
    Ok(with_session(&session, WatchlistResponse::new(&session, None)))
}

#[derive(Debug, Deserialize)]
struct WatchRequest {
    symbol: String,
    #[serde(default)]
    exchange: Option<Exchange>,
}

async fn watch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<WatchRequest>,
) -> ApiResult<Response> {
    let exchange = body
        .exchange
        .unwrap_or(state.dashboard.config().default_exchange);
    let symbol = normalize_symbol(&body.symbol, exchange)?;

    let (session, added) = state
        .sessions
        .update(session_id(&headers), |session| session.watch(symbol.clone()))?;
    if added {
        tracing::info!(%symbol, session = %session.id, "Added to watchlist");
    }

    Ok(with_session(&session, WatchlistResponse::new(&session, Some(added))))
}

async fn unwatch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(symbol): Path<String>,
) -> ApiResult<Response> {
    let symbol = symbol.trim().to_uppercase();
    let (session, removed) = state
        .sessions
        .update(session_id(&headers), |session| session.unwatch(&symbol))?;

    Ok(with_session(&session, WatchlistResponse::new(&session, Some(removed))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockMarketDataProvider, MockNewsProvider};
    use crate::config::DashboardConfig;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn state_with(market: MockMarketDataProvider) -> Arc<AppState> {
        let mut news = MockNewsProvider::new();
        news.expect_headlines().returning(|_, _, _| Ok(Vec::new()));
        let dashboard = Dashboard::new(Arc::new(market), Arc::new(news), DashboardConfig::default());
        Arc::new(AppState::new(dashboard).unwrap())
    }

    fn state() -> Arc<AppState> {
        state_with(MockMarketDataProvider::new())
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = router(Arc::clone(state)).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = send(&state(), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = router(state()).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Indian Stock Market Dashboard"));
        assert!(html.contains(r#"data-refresh-secs="300""#));
    }

    #[tokio::test]
    async fn test_blank_lookup_prompts_and_issues_session() {
        let (status, headers, body) = send(&state(), get("/api/lookup")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "prompt");
        assert!(headers.get(SESSION_HEADER).is_some());
    }

    #[tokio::test]
    async fn test_unknown_symbol_lookup() {
        let mut market = MockMarketDataProvider::new();
        market
            .expect_history()
            .returning(|symbol, _| Err(DashboardError::unavailable(symbol, "No data found")));
        let state = state_with(market);

        let (status, _, body) = send(&state, get("/api/lookup?symbol=nosuch&exchange=BSE")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "not_found");
        assert_eq!(
            body["message"],
            "Could not find data for NOSUCH.BO. Please check if the symbol is correct and try again."
        );
    }

    #[tokio::test]
    async fn test_lookup_rejects_bad_exchange() {
        let (status, _, _) = send(&state(), get("/api/lookup?symbol=TCS&exchange=LSE")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_watchlist_add_is_idempotent() {
        let state = state();
        let post = |session: Option<&str>| {
            let mut builder = Request::builder()
                .method("POST")
                .uri("/api/watchlist")
                .header("content-type", "application/json");
            if let Some(id) = session {
                builder = builder.header("x-session-id", id);
            }
            builder.body(Body::from(r#"{"symbol":"tcs"}"#)).unwrap()
        };

        let (status, headers, body) = send(&state, post(None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbols"], serde_json::json!(["TCS.NS"]));
        assert_eq!(body["changed"], true);
        let id = headers[SESSION_HEADER].to_str().unwrap().to_string();

        let (_, headers, body) = send(&state, post(Some(&id))).await;
        assert_eq!(headers[SESSION_HEADER].to_str().unwrap(), id);
        assert_eq!(body["symbols"], serde_json::json!(["TCS.NS"]));
        assert_eq!(body["changed"], false);

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/watchlist/TCS.NS")
            .header("x-session-id", &id)
            .body(Body::empty())
            .unwrap();
        let (_, _, body) = send(&state, delete).await;
        assert_eq!(body["symbols"], serde_json::json!([]));
        assert_eq!(body["changed"], true);
    }

    #[tokio::test]
    async fn test_watchlist_rejects_invalid_symbol() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/watchlist")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"symbol":"  "}"#))
            .unwrap();
        let (status, _, body) = send(&state(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid symbol"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let state = state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/watchlist")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"symbol":"INFY"}"#))
            .unwrap();
        send(&state, request).await;

        let (_, _, body) = send(&state, get("/api/watchlist")).await;
        assert_eq!(body["symbols"], serde_json::json!([]));
    }
}
