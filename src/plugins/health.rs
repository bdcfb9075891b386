use crate::kernel::Plugin;
use axum::{routing::get, Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct Health {
    success: bool,
    message: &'static str,
    timestamp: DateTime<Utc>,
    environment: String,
    version: &'static str,
}

#[derive(Clone)]
struct Environment(String);

pub struct HealthPlugin {
    environment: String,
}

impl HealthPlugin {
    pub fn new(environment: impl Into<String>) -> Self {
        Self { environment: environment.into() }
    }
}

#[axum::debug_handler]
async fn health_handler(Extension(Environment(environment)): Extension<Environment>) -> Json<Health> {
    Json(Health {
        success: true,
        message: "Server is running",
        timestamp: Utc::now(),
        environment,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[async_trait::async_trait]
impl Plugin for HealthPlugin {
    async fn router(&self) -> Router {
        Router::new()
            .route("/", get(health_handler))
            .layer(Extension(Environment(self.environment.clone())))
    }

    fn name(&self) -> &'static str {
        "health"
    }

    async fn on_start(&self) {
        tracing::info!(environment = %self.environment, "health plugin started");
    }
}
