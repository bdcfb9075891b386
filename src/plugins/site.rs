//! Crawler files served at the site root, outside `/api`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};

use crate::config::AppConfig;

/// Google's certification authority id for AdSense sellers.
const ADSENSE_CERT_ID: &str = "f08c47fec0942fa0";

#[derive(Clone, Debug)]
pub struct SiteFiles {
    frontend_url: String,
    adsense_publisher_id: Option<String>,
}

impl SiteFiles {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
            adsense_publisher_id: config.adsense_publisher_id.clone(),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/robots.txt", get(robots_txt))
            .route("/ads.txt", get(ads_txt))
            .layer(Extension(self.clone()))
    }

    fn robots(&self) -> String {
        format!(
            "User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /admin/\n\nSitemap: {}/sitemap.xml",
            self.frontend_url
        )
    }

    fn ads(&self) -> Option<String> {
        self.adsense_publisher_id
            .as_deref()
            .map(|publisher| format!("google.com, {publisher}, DIRECT, {ADSENSE_CERT_ID}"))
    }
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

async fn robots_txt(Extension(site): Extension<SiteFiles>) -> Response {
    plain_text(StatusCode::OK, site.robots())
}

async fn ads_txt(Extension(site): Extension<SiteFiles>) -> Response {
    match site.ads() {
        Some(body) => plain_text(StatusCode::OK, body),
        None => plain_text(StatusCode::NOT_FOUND, "AdSense not configured".to_string()),
    }
}
