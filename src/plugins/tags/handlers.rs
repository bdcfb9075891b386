use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use super::models::TagPayload;
use crate::http_error::{ApiJson, AppError};
use crate::plugins::shared::{parse_id, ApiResponse, Empty};
use crate::store::{DynStore, Tag};

fn tag_not_found() -> AppError {
    AppError::not_found("Tag not found")
}

pub async fn list_tags(Extension(store): Extension<DynStore>) -> Result<Json<ApiResponse<Vec<Tag>>>, AppError> {
    Ok(Json(ApiResponse::ok(store.list_tags().await?)))
}

pub async fn create_tag(
    Extension(store): Extension<DynStore>,
    ApiJson(payload): ApiJson<TagPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Tag>>), AppError> {
    let tag = payload.validated()?.ok_or_else(|| AppError::validation("Tag name is required"))?;
    let created = store
        .insert_tag(Tag { id: Uuid::new_v4(), name: tag.name, slug: tag.slug, created_at: Utc::now() })
        .await?;
    tracing::info!(tag = %created.id, slug = %created.slug, "tag created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn update_tag(
    Extension(store): Extension<DynStore>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<TagPayload>,
) -> Result<Json<ApiResponse<Tag>>, AppError> {
    let id = parse_id(&id).ok_or_else(tag_not_found)?;
    let (name, slug) = match payload.validated()? {
        Some(tag) => (Some(tag.name), Some(tag.slug)),
        None => (None, None),
    };
    let updated = store.update_tag(id, name, slug).await?.ok_or_else(tag_not_found)?;
    Ok(Json(ApiResponse::ok(updated)))
}

pub async fn delete_tag(
    Extension(store): Extension<DynStore>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Empty>>, AppError> {
    let id = parse_id(&id).ok_or_else(tag_not_found)?;
    store.delete_tag(id).await?.ok_or_else(tag_not_found)?;
    tracing::info!(tag = %id, "tag deleted");
    Ok(Json(ApiResponse::ok(Empty {})))
}
