#![allow(dead_code)]

use std::process::Command;
use std::sync::Arc;

use blog_cms_api::config::AppConfig;
use blog_cms_api::db;
use blog_cms_api::kernel::{build_app, Plugin};
use blog_cms_api::media::{DynMediaHost, MemoryMediaHost};
use blog_cms_api::plugins::api_plugins;
use blog_cms_api::plugins::auth::{AdminCredentials, AuthService, StaticAdminProvider};
use blog_cms_api::plugins::metrics::MetricsPlugin;
use blog_cms_api::store::{DynStore, InMemoryStore};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const JWT_SECRET: &str = "blog-cms-test-secret";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse";

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        admin: AdminCredentials {
            email: Some(ADMIN_EMAIL.to_string()),
            password: Some(ADMIN_PASSWORD.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A running server plus handles on the services behind it.
pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    pub store: DynStore,
    pub media: Arc<MemoryMediaHost>,
    server_handle: JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_app() -> anyhow::Result<TestApp> {
    spawn_app_with(test_config(), InMemoryStore::new().into_arc()).await
}

pub async fn spawn_app_with(config: AppConfig, store: DynStore) -> anyhow::Result<TestApp> {
    let media = Arc::new(MemoryMediaHost::new());
    let dyn_media: DynMediaHost = media.clone();
    let auth = AuthService::new(StaticAdminProvider::new(config.admin.clone()), &config.jwt_secret);
    let plugins = api_plugins(store.clone(), dyn_media, auth, &config.environment);
    let (base, server_handle) = spawn_plugins(plugins, &config).await?;
    Ok(TestApp { base, client: reqwest::Client::new(), store, media, server_handle })
}

/// Serves `plugins` on an ephemeral port and returns the base URL.
pub async fn spawn_plugins(plugins: Vec<Box<dyn Plugin>>, config: &AppConfig) -> anyhow::Result<(String, JoinHandle<()>)> {
    let metrics = MetricsPlugin::new()?;
    let app = build_app(&plugins, Some(metrics), config).await;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });
    Ok((format!("http://{}", addr), server_handle))
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn login(&self) -> anyhow::Result<String> {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == reqwest::StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("login response had no token: {body}"))
    }

    /// POSTs `body` with the bearer token and returns status and parsed body.
    pub async fn post_json(&self, path: &str, token: &str, body: Value) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        let res = self.client.post(self.url(path)).bearer_auth(token).json(&body).send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }

    pub async fn put_json(&self, path: &str, token: &str, body: Value) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        let res = self.client.put(self.url(path)).bearer_auth(token).json(&body).send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }

    pub async fn get_json(&self, path: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        let res = self.client.get(self.url(path)).send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }

    pub async fn delete(&self, path: &str, token: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }
}

/// Drops the throwaway database when the test ends.
pub struct TestDbGuard {
    maintenance_url: String,
    unique_db: String,
}

impl Drop for TestDbGuard {
    fn drop(&mut self) {
        let _ = Command::new("psql")
            .arg(&self.maintenance_url)
            .arg("-c")
            .arg(format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}' AND pid <> pg_backend_pid();",
                self.unique_db
            ))
            .status();
        let _ = Command::new("psql")
            .arg(&self.maintenance_url)
            .arg("-c")
            .arg(format!("DROP DATABASE IF EXISTS \"{}\"", self.unique_db))
            .status();
    }
}

/// Creates a uniquely named database next to `test_db` and migrates it.
pub async fn create_test_db_and_pool(test_db: &str) -> anyhow::Result<(db::DbPool, TestDbGuard)> {
    let (prefix, base_name) = test_db
        .rsplit_once('/')
        .ok_or_else(|| anyhow::anyhow!("TEST_DATABASE_URL has no database name: {test_db}"))?;
    let base_name = base_name.split('?').next().unwrap_or(base_name);
    let maintenance_url = format!("{prefix}/postgres");
    let unique_db = format!("{}_{}", base_name, uuid::Uuid::new_v4().simple());
    let unique_db_url = format!("{prefix}/{unique_db}");

    let _ = Command::new("psql")
        .arg(&maintenance_url)
        .arg("-c")
        .arg(format!("CREATE DATABASE \"{}\"", unique_db))
        .status();
    let guard = TestDbGuard { maintenance_url, unique_db };
    let pool = db::init_db(&unique_db_url).await?;
    Ok((pool, guard))
}
