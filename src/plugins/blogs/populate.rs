//! Resolves the category and tag ids held by blogs into `{id, name, slug}`
//! summaries. One batched lookup per kind, however many blogs are rendered.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::store::{BlogImage, BlogRecord, Category, ContentStore, StoreResult, Tag};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RefSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<Category> for RefSummary {
    fn from(c: Category) -> Self {
        Self { id: c.id, name: c.name, slug: c.slug }
    }
}

impl From<Tag> for RefSummary {
    fn from(t: Tag) -> Self {
        Self { id: t.id, name: t.name, slug: t.slug }
    }
}

/// Wire shape of a blog with its references resolved.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub category: Option<RefSummary>,
    pub tags: Vec<RefSummary>,
    pub author: String,
    pub views_count: i64,
    pub likes_count: i64,
    pub is_featured: bool,
    pub images: Vec<BlogImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn resolve_many(store: &dyn ContentStore, blogs: Vec<BlogRecord>) -> StoreResult<Vec<BlogView>> {
    if blogs.is_empty() {
        return Ok(Vec::new());
    }

    let category_ids: Vec<Uuid> = blogs
        .iter()
        .filter_map(|b| b.category_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let tag_ids: Vec<Uuid> = blogs
        .iter()
        .flat_map(|b| b.tag_ids.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let (categories, tags) = futures::try_join!(
        lookup_categories(store, &category_ids),
        lookup_tags(store, &tag_ids)
    )?;

    let categories: HashMap<Uuid, RefSummary> = categories.into_iter().map(|c| (c.id, c.into())).collect();
    let tags: HashMap<Uuid, RefSummary> = tags.into_iter().map(|t| (t.id, t.into())).collect();

    Ok(blogs
        .into_iter()
        .map(|blog| {
            // dangling references resolve to null / are dropped
            let category = blog.category_id.and_then(|id| categories.get(&id).cloned());
            let blog_tags = blog.tag_ids.iter().filter_map(|id| tags.get(id).cloned()).collect();
            BlogView {
                id: blog.id,
                title: blog.title,
                slug: blog.slug,
                content: blog.content,
                excerpt: blog.excerpt,
                status: blog.status,
                category,
                tags: blog_tags,
                author: blog.author,
                views_count: blog.views_count,
                likes_count: blog.likes_count,
                is_featured: blog.is_featured,
                images: blog.images,
                created_at: blog.created_at,
                updated_at: blog.updated_at,
            }
        })
        .collect())
}

pub async fn resolve_one(store: &dyn ContentStore, blog: BlogRecord) -> StoreResult<BlogView> {
    let mut views = resolve_many(store, vec![blog]).await?;
    Ok(views.remove(0))
}

async fn lookup_categories(store: &dyn ContentStore, ids: &[Uuid]) -> StoreResult<Vec<Category>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    store.categories_by_ids(ids).await
}

async fn lookup_tags(store: &dyn ContentStore, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    store.tags_by_ids(ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn blog(category_id: Option<Uuid>, tag_ids: Vec<Uuid>) -> BlogRecord {
        let now = Utc::now();
        BlogRecord {
            id: Uuid::new_v4(),
            title: "Resolving".into(),
            slug: format!("resolving-{}", Uuid::new_v4().simple()),
            content: "body".into(),
            excerpt: None,
            status: "draft".into(),
            category_id,
            tag_ids,
            author: "admin_001".into(),
            views_count: 0,
            likes_count: 0,
            is_featured: false,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn dangling_references_are_dropped() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let tech = store
            .insert_category(Category { id: Uuid::new_v4(), name: "Tech".into(), slug: "tech".into(), description: None, created_at: now })
            .await
            .unwrap();
        let rust = store
            .insert_tag(Tag { id: Uuid::new_v4(), name: "Rust".into(), slug: "rust".into(), created_at: now })
            .await
            .unwrap();

        let resolved = resolve_many(
            &store,
            vec![
                blog(Some(tech.id), vec![rust.id, Uuid::new_v4()]),
                blog(Some(Uuid::new_v4()), vec![]),
            ],
        )
        .await
        .unwrap();

        assert_eq!(resolved[0].category.as_ref().map(|c| c.slug.as_str()), Some("tech"));
        assert_eq!(resolved[0].tags, vec![RefSummary { id: rust.id, name: "Rust".into(), slug: "rust".into() }]);
        assert!(resolved[1].category.is_none());
        assert!(resolved[1].tags.is_empty());
    }
}
