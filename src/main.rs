use std::net::SocketAddr;

use anyhow::Context;
use blog_cms_api::config::AppConfig;
use blog_cms_api::kernel::build_app;
use blog_cms_api::media::{CloudinaryHost, DynMediaHost, MemoryMediaHost};
use blog_cms_api::plugins::api_plugins;
use blog_cms_api::plugins::auth::{AuthService, StaticAdminProvider};
use blog_cms_api::plugins::metrics::MetricsPlugin;
use blog_cms_api::db;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment before anything reads it
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let store = db::open_store(config.database_url.as_deref()).await?;

    let media: DynMediaHost = match config.cloudinary.clone() {
        Some(cloudinary) => CloudinaryHost::new(cloudinary).into_arc(),
        None => {
            tracing::warn!("Cloudinary is not configured, uploaded images are kept in memory");
            MemoryMediaHost::new().into_arc()
        }
    };

    let auth = AuthService::new(StaticAdminProvider::new(config.admin.clone()), &config.jwt_secret);

    let plugins_vec = api_plugins(store, media, auth, &config.environment);
    let plugin_names: Vec<&'static str> = plugins_vec.iter().map(|p| p.name()).collect();
    tracing::info!("mounting plugins: {:?}", plugin_names);

    let metrics_plugin = MetricsPlugin::new().context("failed to register metrics")?;
    let app = build_app(&plugins_vec, Some(metrics_plugin), &config).await;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(environment = %config.environment, "listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
            // call plugin shutdown hooks
            for p in plugins_vec.iter() {
                p.on_shutdown().await;
            }
        })
        .await?;

    Ok(())
}
