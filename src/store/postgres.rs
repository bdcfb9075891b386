use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    BlogChanges, BlogImage, BlogQuery, BlogRecord, Category, CategoryChanges, ContentStore, DynStore, StoreError,
    StoreResult, Tag,
};

const BLOG_COLUMNS: &str = "id, title, slug, content, excerpt, status, category_id, tag_ids, author, views_count, likes_count, is_featured, images, created_at, updated_at";

#[derive(FromRow)]
struct BlogRow {
    id: Uuid,
    title: String,
    slug: String,
    content: String,
    excerpt: Option<String>,
    status: String,
    category_id: Option<Uuid>,
    tag_ids: Vec<Uuid>,
    author: String,
    views_count: i64,
    likes_count: i64,
    is_featured: bool,
    images: Json<Vec<BlogImage>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogRow> for BlogRecord {
    fn from(r: BlogRow) -> Self {
        BlogRecord {
            id: r.id,
            title: r.title,
            slug: r.slug,
            content: r.content,
            excerpt: r.excerpt,
            status: r.status,
            category_id: r.category_id,
            tag_ids: r.tag_ids,
            author: r.author,
            views_count: r.views_count,
            likes_count: r.likes_count,
            is_featured: r.is_featured,
            images: r.images.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Maps unique violations (SQLSTATE 23505) to `DuplicateKey`, naming the
/// column from the constraint.
fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            let field = match db.constraint() {
                Some(cons) if cons.contains("slug") => "slug",
                Some(cons) if cons.contains("name") => "name",
                _ => "key",
            };
            return StoreError::DuplicateKey(field.to_string());
        }
    }
    StoreError::Backend(e.to_string())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn into_arc(self) -> DynStore {
        Arc::new(self)
    }
}

enum Param {
    Uuid(Uuid),
    Str(String),
}

#[async_trait]
impl ContentStore for PgStore {
    async fn insert_blog(&self, blog: BlogRecord) -> StoreResult<BlogRecord> {
        let sql = format!(
            "INSERT INTO blogs ({BLOG_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15) RETURNING {BLOG_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(blog.id)
            .bind(&blog.title)
            .bind(&blog.slug)
            .bind(&blog.content)
            .bind(&blog.excerpt)
            .bind(&blog.status)
            .bind(blog.category_id)
            .bind(&blog.tag_ids)
            .bind(&blog.author)
            .bind(blog.views_count)
            .bind(blog.likes_count)
            .bind(blog.is_featured)
            .bind(Json(&blog.images))
            .bind(blog.created_at)
            .bind(blog.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.into())
    }

    async fn find_blog(&self, id: Uuid) -> StoreResult<Option<BlogRecord>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1");
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn find_blog_by_slug(&self, slug: &str) -> StoreResult<Option<BlogRecord>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE slug = $1");
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn list_blogs(&self, query: &BlogQuery) -> StoreResult<(Vec<BlogRecord>, u64)> {
        let mut where_clauses: Vec<String> = Vec::new();
        let mut params: Vec<Param> = Vec::new();
        if let Some(category) = query.category {
            where_clauses.push(format!("category_id = ${}", params.len() + 1));
            params.push(Param::Uuid(category));
        }
        if let Some(search) = query.search.clone() {
            where_clauses.push(format!(
                "to_tsvector('english', title || ' ' || content) @@ plainto_tsquery('english', ${})",
                params.len() + 1
            ));
            params.push(Param::Str(search));
        }
        let where_sql = if where_clauses.is_empty() { "1=1".to_string() } else { where_clauses.join(" AND ") };
        let direction = if query.descending { "DESC" } else { "ASC" };

        let items_sql = format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE {where_sql} ORDER BY {} {direction}, id LIMIT ${} OFFSET ${}",
            query.sort.column(),
            params.len() + 1,
            params.len() + 2
        );
        let mut items_q = sqlx::query_as::<_, BlogRow>(&items_sql);
        for p in &params {
            match p {
                Param::Uuid(id) => items_q = items_q.bind(*id),
                Param::Str(s) => items_q = items_q.bind(s.clone()),
            }
        }
        let rows = items_q
            .bind(query.limit as i64)
            .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let count_sql = format!("SELECT COUNT(*) FROM blogs WHERE {where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for p in &params {
            match p {
                Param::Uuid(id) => count_q = count_q.bind(*id),
                Param::Str(s) => count_q = count_q.bind(s.clone()),
            }
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(map_sqlx)?;

        Ok((rows.into_iter().map(Into::into).collect(), total.max(0) as u64))
    }

    async fn featured_blogs(&self, limit: u64) -> StoreResult<Vec<BlogRecord>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE is_featured ORDER BY created_at DESC LIMIT $1");
        let rows = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn trending_blogs(&self, since: DateTime<Utc>, limit: u64) -> StoreResult<Vec<BlogRecord>> {
        let sql = format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE created_at >= $1 ORDER BY views_count DESC, likes_count DESC, id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(since)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_blog(&self, id: Uuid, changes: BlogChanges) -> StoreResult<Option<BlogRecord>> {
        let sql = format!(
            "UPDATE blogs SET title = COALESCE($1, title), slug = COALESCE($2, slug), content = COALESCE($3, content), \
             excerpt = CASE WHEN $4 THEN $5 ELSE excerpt END, status = COALESCE($6, status), \
             category_id = CASE WHEN $7 THEN $8 ELSE category_id END, tag_ids = COALESCE($9, tag_ids), \
             is_featured = COALESCE($10, is_featured), images = COALESCE($11, images), updated_at = $12 \
             WHERE id = $13 RETURNING {BLOG_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(changes.title)
            .bind(changes.slug)
            .bind(changes.content)
            .bind(changes.excerpt.is_some())
            .bind(changes.excerpt.flatten())
            .bind(changes.status)
            .bind(changes.category_id.is_some())
            .bind(changes.category_id.flatten())
            .bind(changes.tag_ids)
            .bind(changes.is_featured)
            .bind(changes.images.map(Json))
            .bind(changes.updated_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn set_views(&self, id: Uuid, views_count: i64) -> StoreResult<()> {
        sqlx::query("UPDATE blogs SET views_count = $1 WHERE id = $2")
            .bind(views_count)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_blog(&self, id: Uuid) -> StoreResult<Option<BlogRecord>> {
        let sql = format!("DELETE FROM blogs WHERE id = $1 RETURNING {BLOG_COLUMNS}");
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug, description, created_at FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn categories_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug, description, created_at FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        sqlx::query_as::<_, Category>("INSERT INTO categories (id, name, slug, description, created_at) VALUES ($1,$2,$3,$4,$5) RETURNING id, name, slug, description, created_at")
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(category.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> StoreResult<Option<Category>> {
        sqlx::query_as::<_, Category>("UPDATE categories SET name = COALESCE($1, name), slug = COALESCE($2, slug), description = CASE WHEN $3 THEN $4 ELSE description END WHERE id = $5 RETURNING id, name, slug, description, created_at")
            .bind(changes.name)
            .bind(changes.slug)
            .bind(changes.description.is_some())
            .bind(changes.description.flatten())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        sqlx::query_as::<_, Category>("DELETE FROM categories WHERE id = $1 RETURNING id, name, slug, description, created_at")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug, created_at FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug, created_at FROM tags WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_tag(&self, tag: Tag) -> StoreResult<Tag> {
        sqlx::query_as::<_, Tag>("INSERT INTO tags (id, name, slug, created_at) VALUES ($1,$2,$3,$4) RETURNING id, name, slug, created_at")
            .bind(tag.id)
            .bind(&tag.name)
            .bind(&tag.slug)
            .bind(tag.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn update_tag(&self, id: Uuid, name: Option<String>, slug: Option<String>) -> StoreResult<Option<Tag>> {
        sqlx::query_as::<_, Tag>("UPDATE tags SET name = COALESCE($1, name), slug = COALESCE($2, slug) WHERE id = $3 RETURNING id, name, slug, created_at")
            .bind(name)
            .bind(slug)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn delete_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        sqlx::query_as::<_, Tag>("DELETE FROM tags WHERE id = $1 RETURNING id, name, slug, created_at")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }
}
