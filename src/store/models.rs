use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogImage {
    pub url: String,
    pub public_id: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub caption: String,
}

/// A stored blog post. References to category and tags are raw ids; see
/// `plugins::blogs::populate` for resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub category_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub author: String,
    pub views_count: i64,
    pub likes_count: i64,
    pub is_featured: bool,
    pub images: Vec<BlogImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a blog. `None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` clears the excerpt.
    pub excerpt: Option<Option<String>>,
    pub status: Option<String>,
    /// `Some(None)` clears the category.
    pub category_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub is_featured: Option<bool>,
    pub images: Option<Vec<BlogImage>>,
    pub updated_at: DateTime<Utc>,
}

impl BlogChanges {
    pub fn touching(updated_at: DateTime<Utc>) -> Self {
        Self {
            title: None,
            slug: None,
            content: None,
            excerpt: None,
            status: None,
            category_id: None,
            tag_ids: None,
            is_featured: None,
            images: None,
            updated_at,
        }
    }

    pub fn apply(self, blog: &mut BlogRecord) {
        if let Some(title) = self.title {
            blog.title = title;
        }
        if let Some(slug) = self.slug {
            blog.slug = slug;
        }
        if let Some(content) = self.content {
            blog.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            blog.excerpt = excerpt;
        }
        if let Some(status) = self.status {
            blog.status = status;
        }
        if let Some(category_id) = self.category_id {
            blog.category_id = category_id;
        }
        if let Some(tag_ids) = self.tag_ids {
            blog.tag_ids = tag_ids;
        }
        if let Some(is_featured) = self.is_featured {
            blog.is_featured = is_featured;
        }
        if let Some(images) = self.images {
            blog.images = images;
        }
        blog.updated_at = self.updated_at;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    ViewsCount,
    LikesCount,
}

impl SortField {
    /// Parses the public `sortBy` name. Unknown names fall back to `createdAt`.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("updatedAt") => SortField::UpdatedAt,
            Some("title") => SortField::Title,
            Some("viewsCount") => SortField::ViewsCount,
            Some("likesCount") => SortField::LikesCount,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
            SortField::ViewsCount => "views_count",
            SortField::LikesCount => "likes_count",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogQuery {
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub sort: SortField,
    pub descending: bool,
    pub offset: u64,
    pub limit: u64,
}
