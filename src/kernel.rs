use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method, Request, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::http_error::AppError;
use crate::plugins::metrics::{track_requests, MetricsPlugin};
use crate::plugins::site::SiteFiles;

/// Request bodies larger than this are rejected before reaching handlers.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[async_trait]
pub trait Plugin: Send + Sync {
    async fn router(&self) -> Router;

    fn name(&self) -> &'static str;
    /// Optional lifecycle hook called when the kernel starts.
    async fn on_start(&self) {}
    /// Optional lifecycle hook called on shutdown.
    async fn on_shutdown(&self) {}
}

/// Builds the application router by mounting each plugin under `/api/{plugin.name()}`.
/// `robots.txt` and `ads.txt` are served from the root.
pub async fn build_app(plugins: &[Box<dyn Plugin>], metrics: Option<MetricsPlugin>, config: &AppConfig) -> Router {
    let mut api = Router::new();

    for plugin in plugins.iter() {
        info!("starting plugin {}", plugin.name());
        plugin.on_start().await;
        let router = plugin.router().await;
        api = api.nest(&format!("/{}", plugin.name()), router);
    }

    if let Some(metrics) = &metrics {
        api = api.nest("/metrics", metrics.router());
    }

    let mut app = Router::new().nest("/api", api).merge(SiteFiles::from_config(config).router());
    if let Some(metrics) = metrics {
        app = app.layer(middleware::from_fn_with_state(metrics, track_requests));
    }

    app.fallback(not_found)
        .layer(middleware::from_fn_with_state(config.is_production(), hide_server_errors))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("Not Found - {}", uri.path()))
}

/// In production, 5xx messages are replaced so internal details never leave
/// the process. They are logged where the error is rendered. A machine
/// readable `code` survives.
async fn hide_server_errors(State(production): State<bool>, req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    if !production || !res.status().is_server_error() {
        return res;
    }
    let status = res.status();
    let code = match axum::body::to_bytes(res.into_body(), BODY_LIMIT_BYTES).await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes).ok().and_then(|body| body.get("code").cloned()),
        Err(_) => None,
    };
    let error = status.canonical_reason().unwrap_or("Internal Server Error");
    let mut body = json!({ "success": false, "error": error });
    if let Some(code) = code {
        body["code"] = code;
    }
    (status, Json(body)).into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring invalid CORS origin {o}");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed).allow_credentials(true)
}
