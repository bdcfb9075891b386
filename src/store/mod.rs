//! Persistence for blogs, categories and tags.
//!
//! Handlers only see [`ContentStore`]; PostgreSQL and in-memory backends live
//! in the submodules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::InMemoryStore;
pub use models::*;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column (slug, name) already holds the value.
    #[error("duplicate value for {0}")]
    DuplicateKey(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    async fn insert_blog(&self, blog: BlogRecord) -> StoreResult<BlogRecord>;
    async fn find_blog(&self, id: Uuid) -> StoreResult<Option<BlogRecord>>;
    async fn find_blog_by_slug(&self, slug: &str) -> StoreResult<Option<BlogRecord>>;
    /// Returns one page of matches plus the total number of matches.
    async fn list_blogs(&self, query: &BlogQuery) -> StoreResult<(Vec<BlogRecord>, u64)>;
    async fn featured_blogs(&self, limit: u64) -> StoreResult<Vec<BlogRecord>>;
    /// Blogs created at or after `since`, most viewed first, likes as tiebreak.
    async fn trending_blogs(&self, since: DateTime<Utc>, limit: u64) -> StoreResult<Vec<BlogRecord>>;
    async fn update_blog(&self, id: Uuid, changes: BlogChanges) -> StoreResult<Option<BlogRecord>>;
    /// Overwrites the view counter; callers do the read-modify-write.
    async fn set_views(&self, id: Uuid, views_count: i64) -> StoreResult<()>;
    async fn delete_blog(&self, id: Uuid) -> StoreResult<Option<BlogRecord>>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn categories_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>>;
    async fn insert_category(&self, category: Category) -> StoreResult<Category>;
    async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> StoreResult<Option<Category>>;
    async fn delete_category(&self, id: Uuid) -> StoreResult<Option<Category>>;

    async fn list_tags(&self) -> StoreResult<Vec<Tag>>;
    async fn tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>>;
    async fn insert_tag(&self, tag: Tag) -> StoreResult<Tag>;
    /// Renames a tag; `slug` is stored alongside.
    async fn update_tag(&self, id: Uuid, name: Option<String>, slug: Option<String>) -> StoreResult<Option<Tag>>;
    async fn delete_tag(&self, id: Uuid) -> StoreResult<Option<Tag>>;
}

pub type DynStore = Arc<dyn ContentStore>;
