use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::{routing::get, Router};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct MetricsPlugin {
    registry: Arc<Registry>,
    pub request_counter: Arc<IntCounterVec>,
    pub request_duration: Arc<HistogramVec>,
}

impl MetricsPlugin {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let counter = IntCounterVec::new(Opts::new("requests_total", "Total HTTP requests"), &["method", "path", "status"])?;
        registry.register(Box::new(counter.clone()))?;

        let hist_opts = HistogramOpts::new("request_duration_seconds", "HTTP request latencies in seconds");
        let histogram = HistogramVec::new(hist_opts, &["method", "path"])?;
        registry.register(Box::new(histogram.clone()))?;

        #[cfg(target_os = "linux")]
        {
            let collector = prometheus::process_collector::ProcessCollector::for_self();
            registry.register(Box::new(collector)).ok();
        }

        Ok(MetricsPlugin {
            registry: Arc::new(registry),
            request_counter: Arc::new(counter),
            request_duration: Arc::new(histogram),
        })
    }

    pub fn router(&self) -> Router {
        let reg = self.registry.clone();
        Router::new().route(
            "/",
            get(move || {
                let encoder = TextEncoder::new();
                let mut buffer = Vec::new();
                let rendered = encoder
                    .encode(&reg.gather(), &mut buffer)
                    .map_err(|e| e.to_string())
                    .and_then(|_| String::from_utf8(buffer).map_err(|e| e.to_string()));
                async move {
                    match rendered {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
                    }
                }
            }),
        )
    }
}

/// Records count and latency per route template; unmatched paths share one label.
pub async fn track_requests(State(metrics): State<MetricsPlugin>, req: Request<Body>, next: Next) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    let status = res.status().as_u16().to_string();
    metrics.request_counter.with_label_values(&[&method, &path, &status]).inc();
    metrics
        .request_duration
        .with_label_values(&[&method, &path])
        .observe(started.elapsed().as_secs_f64());
    res
}
