use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use super::models::CategoryPayload;
use crate::http_error::{ApiJson, AppError};
use crate::plugins::shared::{parse_id, ApiResponse, Empty};
use crate::store::{Category, DynStore};

fn category_not_found() -> AppError {
    AppError::not_found("Category not found")
}

pub async fn list_categories(Extension(store): Extension<DynStore>) -> Result<Json<ApiResponse<Vec<Category>>>, AppError> {
    Ok(Json(ApiResponse::ok(store.list_categories().await?)))
}

pub async fn create_category(
    Extension(store): Extension<DynStore>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), AppError> {
    let changes = payload.validated()?;
    let (Some(name), Some(slug)) = (changes.name, changes.slug) else {
        return Err(AppError::validation("Category name is required"));
    };
    let category = Category { id: Uuid::new_v4(), name, slug, description: changes.description.flatten(), created_at: Utc::now() };
    let created = store.insert_category(category).await?;
    tracing::info!(category = %created.id, slug = %created.slug, "category created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn update_category(
    Extension(store): Extension<DynStore>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let id = parse_id(&id).ok_or_else(category_not_found)?;
    let changes = payload.validated()?;
    let updated = store.update_category(id, changes).await?.ok_or_else(category_not_found)?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// Blogs still pointing at the category keep a dangling id.
pub async fn delete_category(
    Extension(store): Extension<DynStore>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Empty>>, AppError> {
    let id = parse_id(&id).ok_or_else(category_not_found)?;
    store.delete_category(id).await?.ok_or_else(category_not_found)?;
    tracing::info!(category = %id, "category deleted");
    Ok(Json(ApiResponse::ok(Empty {})))
}
