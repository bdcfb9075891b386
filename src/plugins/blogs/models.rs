use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::http_error::AppError;
use crate::plugins::shared::{clean, clearable, explicit_null, parse_id};
use crate::slug::slugify;
use crate::store::{BlogChanges, BlogImage, BlogQuery, BlogRecord, SortField};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const FEATURED_LIMIT: u64 = 5;
pub const DEFAULT_TRENDING_LIMIT: u64 = 5;
pub const DEFAULT_STATUS: &str = "draft";

/// Single-segment paths under `/api/blogs` routed before the slug lookup.
pub const RESERVED_SLUGS: [&str; 3] = ["featured", "trending", "upload-images"];

/// Image entry as sent by clients. Completeness is checked in
/// [`BlogPayload::validated`] so one bad entry rejects the whole request.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    pub url: Option<String>,
    pub public_id: Option<String>,
    pub position: Option<i32>,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
}

/// Body of both create and update. Every field is optional at the wire
/// level; create enforces the required ones.
#[derive(Deserialize, Validate, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlogPayload {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub excerpt: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub images: Option<Vec<ImageInput>>,
}

/// Payload after trimming, validation and id parsing.
#[derive(Debug)]
pub struct BlogInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<Option<String>>,
    pub status: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub is_featured: Option<bool>,
    pub images: Option<Vec<BlogImage>>,
}

impl BlogPayload {
    pub fn validated(mut self) -> Result<BlogInput, AppError> {
        self.title = self.title.map(|t| t.trim().to_string());
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            self.content = Some(String::new());
        }
        self.validate()?;

        let slug = match &self.title {
            Some(title) => {
                let slug = slugify(title);
                if slug.is_empty() {
                    return Err(AppError::validation("Title must contain at least one letter or digit"));
                }
                if RESERVED_SLUGS.contains(&slug.as_str()) {
                    return Err(AppError::validation(format!("Title cannot produce the reserved slug '{slug}'")));
                }
                Some(slug)
            }
            None => None,
        };

        let category_id = match self.category {
            Some(Some(raw)) if !raw.trim().is_empty() => {
                Some(Some(parse_id(raw.trim()).ok_or_else(|| AppError::validation("Invalid category id"))?))
            }
            // an empty string clears the category like `null`
            Some(_) => Some(None),
            None => None,
        };

        let tag_ids = self
            .tags
            .map(|tags| {
                tags.iter()
                    .map(|t| parse_id(t.trim()).ok_or_else(|| AppError::validation(format!("Invalid tag id: {t}"))))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .map(dedup);

        let images = self.images.map(validate_images).transpose()?;

        Ok(BlogInput {
            title: self.title,
            slug,
            content: self.content,
            excerpt: clearable(self.excerpt),
            status: clean(self.status),
            category_id,
            tag_ids,
            is_featured: self.is_featured,
            images,
        })
    }
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

pub fn validate_images(inputs: Vec<ImageInput>) -> Result<Vec<BlogImage>, AppError> {
    inputs
        .into_iter()
        .map(|img| match (clean(img.url), clean(img.public_id)) {
            (Some(url), Some(public_id)) => Ok(BlogImage {
                url,
                public_id,
                position: img.position.unwrap_or(0),
                alt_text: img.alt_text.unwrap_or_default(),
                caption: img.caption.unwrap_or_default(),
            }),
            _ => Err(AppError::validation("Each image requires a url and a publicId")),
        })
        .collect()
}

impl BlogInput {
    /// Builds a new record; `title` and `content` must be present.
    pub fn into_record(self, author: String, now: DateTime<Utc>) -> Result<BlogRecord, AppError> {
        let (Some(title), Some(slug), Some(content)) = (self.title, self.slug, self.content) else {
            return Err(AppError::validation("Title and content are required"));
        };
        Ok(BlogRecord {
            id: Uuid::new_v4(),
            title,
            slug,
            content,
            excerpt: self.excerpt.flatten(),
            status: self.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            category_id: self.category_id.flatten(),
            tag_ids: self.tag_ids.unwrap_or_default(),
            author,
            views_count: 0,
            likes_count: 0,
            is_featured: self.is_featured.unwrap_or(false),
            images: self.images.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> BlogChanges {
        BlogChanges {
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            status: self.status,
            category_id: self.category_id,
            tag_ids: self.tag_ids,
            is_featured: self.is_featured,
            images: self.images,
            updated_at: now,
        }
    }
}

/// Raw list parameters. Numbers arrive as strings so malformed values fall
/// back to defaults instead of rejecting the request.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// A list request resolved into a store query plus the page echoed back.
#[derive(Debug)]
pub struct ListPlan {
    pub page: u64,
    pub limit: u64,
    /// `None` when the category filter can never match (not a UUID).
    pub query: Option<BlogQuery>,
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).filter(|v| *v >= 1)
}

impl ListQuery {
    pub fn plan(self) -> ListPlan {
        let page = positive(self.page.as_deref()).unwrap_or(1);
        let limit = positive(self.limit.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

        let category = match clean(self.category) {
            Some(raw) => match parse_id(&raw) {
                Some(id) => Some(id),
                None => return ListPlan { page, limit, query: None },
            },
            None => None,
        };

        let query = BlogQuery {
            category,
            search: clean(self.search),
            sort: SortField::from_query(self.sort_by.as_deref()),
            descending: self.sort_order.as_deref().map_or(true, |o| o == "desc"),
            // stores bind the offset as a signed 64-bit value
            offset: (page - 1).saturating_mul(limit).min(i64::MAX as u64),
            limit,
        };
        ListPlan { page, limit, query: Some(query) }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct TrendingQuery {
    pub limit: Option<String>,
    pub period: Option<String>,
}

impl TrendingQuery {
    /// Returns the window start and the result cap.
    pub fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, u64), AppError> {
        let days = match self.period.as_deref().map(str::trim) {
            None | Some("") | Some("7d") => 7,
            Some("30d") => 30,
            Some(other) => return Err(AppError::validation(format!("Invalid period '{other}', expected 7d or 30d"))),
        };
        let limit = positive(self.limit.as_deref()).unwrap_or(DEFAULT_TRENDING_LIMIT).min(MAX_PAGE_SIZE);
        Ok((now - Duration::days(days), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(pairs: &[(&str, &str)]) -> ListQuery {
        let mut q = ListQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "page" => q.page = v,
                "limit" => q.limit = v,
                "category" => q.category = v,
                "search" => q.search = v,
                "sortBy" => q.sort_by = v,
                "sortOrder" => q.sort_order = v,
                _ => unreachable!(),
            }
        }
        q
    }

    #[test]
    fn list_defaults() {
        let plan = list(&[]).plan();
        assert_eq!((plan.page, plan.limit), (1, DEFAULT_PAGE_SIZE));
        let query = plan.query.unwrap();
        assert_eq!(query.sort, SortField::CreatedAt);
        assert!(query.descending);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn list_paging_is_clamped() {
        let plan = list(&[("page", "3"), ("limit", "500")]).plan();
        assert_eq!((plan.page, plan.limit), (3, MAX_PAGE_SIZE));
        assert_eq!(plan.query.unwrap().offset, 200);

        let plan = list(&[("page", "0"), ("limit", "abc")]).plan();
        assert_eq!((plan.page, plan.limit), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn huge_page_offset_fits_in_i64() {
        let plan = list(&[("page", "99999999999999999"), ("limit", "100")]).plan();
        assert_eq!(plan.page, 99_999_999_999_999_999);
        let offset = plan.query.unwrap().offset;
        assert_eq!(offset, i64::MAX as u64);
        assert!(i64::try_from(offset).is_ok());
    }

    #[test]
    fn list_sorting() {
        let query = list(&[("sortBy", "title"), ("sortOrder", "asc")]).plan().query.unwrap();
        assert_eq!(query.sort, SortField::Title);
        assert!(!query.descending);

        let query = list(&[("sortBy", "password"), ("sortOrder", "DESC")]).plan().query.unwrap();
        assert_eq!(query.sort, SortField::CreatedAt);
        assert!(!query.descending);
    }

    #[test]
    fn non_uuid_category_matches_nothing() {
        assert!(list(&[("category", "tech")]).plan().query.is_none());
        let id = Uuid::new_v4();
        let query = list(&[("category", &id.to_string())]).plan().query.unwrap();
        assert_eq!(query.category, Some(id));
    }

    #[test]
    fn trending_window() {
        let now = Utc::now();
        let (since, limit) = TrendingQuery::default().window(now).unwrap();
        assert_eq!(now - since, Duration::days(7));
        assert_eq!(limit, DEFAULT_TRENDING_LIMIT);

        let q = TrendingQuery { limit: Some("2".into()), period: Some("30d".into()) };
        let (since, limit) = q.window(now).unwrap();
        assert_eq!(now - since, Duration::days(30));
        assert_eq!(limit, 2);

        let q = TrendingQuery { limit: None, period: Some("1y".into()) };
        assert_eq!(q.window(now).unwrap_err().status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn create_requires_title_and_content() {
        let input = BlogPayload { content: Some("body".into()), ..Default::default() }.validated().unwrap();
        assert!(input.into_record("admin".into(), Utc::now()).is_err());

        let err = BlogPayload { title: Some("ok title".into()), content: Some("   ".into()), ..Default::default() }
            .validated()
            .unwrap_err();
        assert_eq!(err.message, "Content cannot be empty");
    }

    #[test]
    fn title_is_trimmed_and_slugged() {
        let input = BlogPayload { title: Some("  Hello World!  ".into()), content: Some("x".into()), ..Default::default() }
            .validated()
            .unwrap();
        let record = input.into_record("admin_001".into(), Utc::now()).unwrap();
        assert_eq!(record.title, "Hello World!");
        assert_eq!(record.slug, "hello-world");
        assert_eq!(record.status, DEFAULT_STATUS);
        assert_eq!(record.views_count, 0);
        assert!(!record.is_featured);
    }

    #[test]
    fn short_title_is_rejected() {
        let err = BlogPayload { title: Some(" ab ".into()), ..Default::default() }.validated().unwrap_err();
        assert_eq!(err.message, "Title must be between 3 and 200 characters");
    }

    #[test]
    fn titles_that_shadow_routes_are_rejected() {
        for title in ["Trending", "  featured ", "Upload Images"] {
            let err = BlogPayload { title: Some(title.into()), content: Some("x".into()), ..Default::default() }
                .validated()
                .unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST, "{title}");
        }
        let input = BlogPayload { title: Some("Trending topics".into()), content: Some("x".into()), ..Default::default() }
            .validated()
            .unwrap();
        assert_eq!(input.slug.as_deref(), Some("trending-topics"));
    }

    #[test]
    fn null_or_blank_excerpt_clears_it() {
        let payload: BlogPayload = serde_json::from_str(r#"{"excerpt": null}"#).unwrap();
        assert_eq!(payload.validated().unwrap().excerpt, Some(None));
        let payload: BlogPayload = serde_json::from_str(r#"{"excerpt": ""}"#).unwrap();
        assert_eq!(payload.validated().unwrap().excerpt, Some(None));
        let payload: BlogPayload = serde_json::from_str(r#"{"excerpt": " short "}"#).unwrap();
        assert_eq!(payload.validated().unwrap().excerpt, Some(Some("short".to_string())));
    }

    #[test]
    fn incomplete_image_rejects_everything() {
        let images = vec![
            ImageInput { url: Some("https://x/1.png".into()), public_id: Some("a".into()), ..Default::default() },
            ImageInput { url: Some("https://x/2.png".into()), ..Default::default() },
        ];
        assert!(validate_images(images).is_err());

        let ok = validate_images(vec![ImageInput {
            url: Some("https://x/1.png".into()),
            public_id: Some("a".into()),
            ..Default::default()
        }])
        .unwrap();
        assert_eq!(ok[0].position, 0);
        assert_eq!(ok[0].alt_text, "");
    }

    #[test]
    fn category_null_clears_and_bad_ids_fail() {
        let payload: BlogPayload = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(payload.validated().unwrap().category_id, Some(None));

        let payload: BlogPayload = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(payload.validated().unwrap().category_id, None);

        let payload: BlogPayload = serde_json::from_str(r#"{"tags": ["nope"]}"#).unwrap();
        assert!(payload.validated().is_err());
    }
}
