use axum::extract::{Multipart, Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;

use super::images;
use super::models::{BlogPayload, ListQuery, TrendingQuery, FEATURED_LIMIT};
use super::populate::{resolve_many, resolve_one, BlogView};
use crate::http_error::{ApiJson, AppError};
use crate::media::DynMediaHost;
use crate::plugins::auth::AuthUser;
use crate::plugins::shared::{parse_id, ApiResponse, Empty, ListResponse, PageMeta};
use crate::store::{BlogImage, BlogRecord, DynStore};

fn blog_not_found() -> AppError {
    AppError::not_found("Blog not found")
}

pub async fn list_blogs(
    Extension(store): Extension<DynStore>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListResponse<BlogView>>, AppError> {
    let plan = q.plan();
    let (records, total) = match &plan.query {
        Some(query) => store.list_blogs(query).await?,
        None => (Vec::new(), 0),
    };
    let data = resolve_many(store.as_ref(), records).await?;
    Ok(Json(ListResponse { success: true, data, meta: PageMeta::new(total, plan.page, plan.limit) }))
}

pub async fn featured_blogs(Extension(store): Extension<DynStore>) -> Result<Json<ApiResponse<Vec<BlogView>>>, AppError> {
    let records = store.featured_blogs(FEATURED_LIMIT).await?;
    Ok(Json(ApiResponse::ok(resolve_many(store.as_ref(), records).await?)))
}

pub async fn trending_blogs(
    Extension(store): Extension<DynStore>,
    Query(q): Query<TrendingQuery>,
) -> Result<Json<ApiResponse<Vec<BlogView>>>, AppError> {
    let (since, limit) = q.window(Utc::now())?;
    let records = store.trending_blogs(since, limit).await?;
    Ok(Json(ApiResponse::ok(resolve_many(store.as_ref(), records).await?)))
}

/// Counts a view and renders the blog. Concurrent views may overwrite each
/// other's increment.
async fn view(store: &DynStore, mut blog: BlogRecord) -> Result<Json<ApiResponse<BlogView>>, AppError> {
    blog.views_count += 1;
    store.set_views(blog.id, blog.views_count).await?;
    Ok(Json(ApiResponse::ok(resolve_one(store.as_ref(), blog).await?)))
}

pub async fn get_blog_by_slug(
    Extension(store): Extension<DynStore>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BlogView>>, AppError> {
    let blog = store.find_blog_by_slug(&slug).await?.ok_or_else(blog_not_found)?;
    view(&store, blog).await
}

pub async fn get_blog_by_id(
    Extension(store): Extension<DynStore>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BlogView>>, AppError> {
    let id = parse_id(&id).ok_or_else(blog_not_found)?;
    let blog = store.find_blog(id).await?.ok_or_else(blog_not_found)?;
    view(&store, blog).await
}

pub async fn create_blog(
    Extension(store): Extension<DynStore>,
    user: AuthUser,
    ApiJson(payload): ApiJson<BlogPayload>,
) -> Result<(StatusCode, Json<ApiResponse<BlogView>>), AppError> {
    let record = payload.validated()?.into_record(user.id, Utc::now())?;
    let created = store.insert_blog(record).await?;
    tracing::info!(blog = %created.id, slug = %created.slug, "blog created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(resolve_one(store.as_ref(), created).await?))))
}

pub async fn update_blog(
    Extension(store): Extension<DynStore>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<BlogPayload>,
) -> Result<Json<ApiResponse<BlogView>>, AppError> {
    let id = parse_id(&id).ok_or_else(blog_not_found)?;
    let changes = payload.validated()?.into_changes(Utc::now());
    let updated = store.update_blog(id, changes).await?.ok_or_else(blog_not_found)?;
    Ok(Json(ApiResponse::ok(resolve_one(store.as_ref(), updated).await?)))
}

pub async fn delete_blog(
    Extension(store): Extension<DynStore>,
    Extension(media): Extension<DynMediaHost>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Empty>>, AppError> {
    let id = parse_id(&id).ok_or_else(blog_not_found)?;
    let deleted = store.delete_blog(id).await?.ok_or_else(blog_not_found)?;

    // hosted images are cleaned up after the record is gone; failures only leave orphans
    for (public_id, err) in images::delete_all(media.as_ref(), &deleted.images).await {
        tracing::warn!(blog = %id, %public_id, error = %err, "failed to delete hosted image");
    }
    tracing::info!(blog = %id, "blog deleted");
    Ok(Json(ApiResponse::ok(Empty {})))
}

pub async fn upload_images(
    Extension(media): Extension<DynMediaHost>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<BlogImage>>>, AppError> {
    let form = images::read_form(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::validation("No images provided"));
    }
    let uploaded = images::upload_all(media.as_ref(), form).await?;
    Ok(Json(ApiResponse::ok(uploaded)))
}
