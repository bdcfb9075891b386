use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    BlogChanges, BlogQuery, BlogRecord, Category, CategoryChanges, ContentStore, DynStore, SortField, StoreError,
    StoreResult, Tag,
};

#[derive(Default)]
struct Tables {
    blogs: HashMap<Uuid, BlogRecord>,
    categories: HashMap<Uuid, Category>,
    tags: HashMap<Uuid, Tag>,
}

/// Process-local store with the same uniqueness rules as the PostgreSQL schema.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_arc(self) -> DynStore {
        Arc::new(self)
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Any search term appearing as a whole word in title or content is a hit.
fn matches_search(blog: &BlogRecord, search: &str) -> bool {
    let terms = words(search);
    if terms.is_empty() {
        return true;
    }
    let mut haystack = words(&blog.title);
    haystack.extend(words(&blog.content));
    terms.iter().any(|t| haystack.contains(t))
}

fn compare(a: &BlogRecord, b: &BlogRecord, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
        SortField::ViewsCount => a.views_count.cmp(&b.views_count),
        SortField::LikesCount => a.likes_count.cmp(&b.likes_count),
    }
}

fn newest_first(blogs: &mut [BlogRecord]) {
    blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

impl Tables {
    fn blog_slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.blogs.values().any(|b| b.slug == slug && Some(b.id) != except)
    }

    fn category_taken(&self, name: &str, slug: &str, except: Option<Uuid>) -> Option<&'static str> {
        for c in self.categories.values().filter(|c| Some(c.id) != except) {
            if c.name == name {
                return Some("name");
            }
            if c.slug == slug {
                return Some("slug");
            }
        }
        None
    }

    fn tag_taken(&self, name: &str, slug: &str, except: Option<Uuid>) -> Option<&'static str> {
        for t in self.tags.values().filter(|t| Some(t.id) != except) {
            if t.name == name {
                return Some("name");
            }
            if t.slug == slug {
                return Some("slug");
            }
        }
        None
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn insert_blog(&self, blog: BlogRecord) -> StoreResult<BlogRecord> {
        let mut tables = self.inner.write();
        if tables.blog_slug_taken(&blog.slug, None) {
            return Err(StoreError::DuplicateKey("slug".to_string()));
        }
        tables.blogs.insert(blog.id, blog.clone());
        Ok(blog)
    }

    async fn find_blog(&self, id: Uuid) -> StoreResult<Option<BlogRecord>> {
        Ok(self.inner.read().blogs.get(&id).cloned())
    }

    async fn find_blog_by_slug(&self, slug: &str) -> StoreResult<Option<BlogRecord>> {
        Ok(self.inner.read().blogs.values().find(|b| b.slug == slug).cloned())
    }

    async fn list_blogs(&self, query: &BlogQuery) -> StoreResult<(Vec<BlogRecord>, u64)> {
        let tables = self.inner.read();
        let mut hits: Vec<BlogRecord> = tables
            .blogs
            .values()
            .filter(|b| query.category.map_or(true, |c| b.category_id == Some(c)))
            .filter(|b| query.search.as_deref().map_or(true, |s| matches_search(b, s)))
            .cloned()
            .collect();
        drop(tables);

        hits.sort_by(|a, b| {
            let ord = compare(a, b, query.sort);
            let ord = if query.descending { ord.reverse() } else { ord };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        let total = hits.len() as u64;
        let page = hits
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn featured_blogs(&self, limit: u64) -> StoreResult<Vec<BlogRecord>> {
        let mut featured: Vec<BlogRecord> = self.inner.read().blogs.values().filter(|b| b.is_featured).cloned().collect();
        newest_first(&mut featured);
        featured.truncate(limit as usize);
        Ok(featured)
    }

    async fn trending_blogs(&self, since: DateTime<Utc>, limit: u64) -> StoreResult<Vec<BlogRecord>> {
        let mut recent: Vec<BlogRecord> =
            self.inner.read().blogs.values().filter(|b| b.created_at >= since).cloned().collect();
        recent.sort_by(|a, b| {
            b.views_count
                .cmp(&a.views_count)
                .then_with(|| b.likes_count.cmp(&a.likes_count))
                .then_with(|| a.id.cmp(&b.id))
        });
        recent.truncate(limit as usize);
        Ok(recent)
    }

    async fn update_blog(&self, id: Uuid, changes: BlogChanges) -> StoreResult<Option<BlogRecord>> {
        let mut tables = self.inner.write();
        if let Some(slug) = changes.slug.as_deref() {
            if tables.blog_slug_taken(slug, Some(id)) {
                return Err(StoreError::DuplicateKey("slug".to_string()));
            }
        }
        let Some(blog) = tables.blogs.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(blog);
        Ok(Some(blog.clone()))
    }

    async fn set_views(&self, id: Uuid, views_count: i64) -> StoreResult<()> {
        if let Some(blog) = self.inner.write().blogs.get_mut(&id) {
            blog.views_count = views_count;
        }
        Ok(())
    }

    async fn delete_blog(&self, id: Uuid) -> StoreResult<Option<BlogRecord>> {
        Ok(self.inner.write().blogs.remove(&id))
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut all: Vec<Category> = self.inner.read().categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn categories_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>> {
        let tables = self.inner.read();
        Ok(ids.iter().filter_map(|id| tables.categories.get(id).cloned()).collect())
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        let mut tables = self.inner.write();
        if let Some(field) = tables.category_taken(&category.name, &category.slug, None) {
            return Err(StoreError::DuplicateKey(field.to_string()));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> StoreResult<Option<Category>> {
        let mut tables = self.inner.write();
        let Some(current) = tables.categories.get(&id).cloned() else {
            return Ok(None);
        };
        let mut next = current;
        if let Some(name) = changes.name {
            next.name = name;
        }
        if let Some(slug) = changes.slug {
            next.slug = slug;
        }
        if let Some(description) = changes.description {
            next.description = description;
        }
        if let Some(field) = tables.category_taken(&next.name, &next.slug, Some(id)) {
            return Err(StoreError::DuplicateKey(field.to_string()));
        }
        tables.categories.insert(id, next.clone());
        Ok(Some(next))
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.inner.write().categories.remove(&id))
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let mut all: Vec<Tag> = self.inner.read().tags.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        let tables = self.inner.read();
        Ok(ids.iter().filter_map(|id| tables.tags.get(id).cloned()).collect())
    }

    async fn insert_tag(&self, tag: Tag) -> StoreResult<Tag> {
        let mut tables = self.inner.write();
        if let Some(field) = tables.tag_taken(&tag.name, &tag.slug, None) {
            return Err(StoreError::DuplicateKey(field.to_string()));
        }
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, id: Uuid, name: Option<String>, slug: Option<String>) -> StoreResult<Option<Tag>> {
        let mut tables = self.inner.write();
        let Some(mut next) = tables.tags.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(name) = name {
            next.name = name;
        }
        if let Some(slug) = slug {
            next.slug = slug;
        }
        if let Some(field) = tables.tag_taken(&next.name, &next.slug, Some(id)) {
            return Err(StoreError::DuplicateKey(field.to_string()));
        }
        tables.tags.insert(id, next.clone());
        Ok(Some(next))
    }

    async fn delete_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        Ok(self.inner.write().tags.remove(&id))
    }
}
