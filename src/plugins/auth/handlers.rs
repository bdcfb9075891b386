use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{Extension, Json};
use serde::Serialize;

use super::models::{LoginRequest, LoginResponse, MessageResponse};
use super::service::AuthService;
use crate::http_error::{ApiJson, AppError};
use crate::plugins::shared::ApiResponse;

/// Decoded bearer token, put in request extensions by `require_auth`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(AppError::unauthorized)
    }
}

pub async fn login(
    Extension(auth): Extension<AuthService>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let data = auth.login(payload.email, payload.password).await?;
    Ok(Json(LoginResponse { success: true, message: "Login successful", data }))
}

/// Tokens are stateless, so there is nothing to revoke.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse { success: true, message: "Logged out successfully" })
}

#[derive(Serialize)]
pub struct VerifyResponse {
    success: bool,
    message: &'static str,
    user: AuthUser,
}

pub async fn verify(user: AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse { success: true, message: "Token is valid", user })
}

#[derive(Serialize)]
pub struct ProfileData {
    user: AuthUser,
}

pub async fn profile(user: AuthUser) -> Json<ApiResponse<ProfileData>> {
    Json(ApiResponse::ok(ProfileData { user }))
}
