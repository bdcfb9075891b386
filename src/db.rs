use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::store::{DynStore, InMemoryStore, PgStore};

pub type DbPool = Pool<Postgres>;

/// Connects and applies the embedded migrations under `migrations/`.
pub async fn init_db(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = PgPoolOptions::new().max_connections(5).connect(database_url).await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// PostgreSQL when a database URL is configured, otherwise a process-local store.
pub async fn open_store(database_url: Option<&str>) -> anyhow::Result<DynStore> {
    match database_url {
        Some(url) => {
            let pool = init_db(url).await?;
            tracing::info!("using postgres content store");
            Ok(PgStore::new(pool).into_arc())
        }
        None => {
            tracing::warn!("DATABASE_URL not set, content is kept in memory and lost on restart");
            Ok(InMemoryStore::new().into_arc())
        }
    }
}
