use chrono::Duration;
use std::sync::Arc;

use super::models::{Claims, LoginData};
use super::provider::AuthProvider;
use super::token::{TokenService, TOKEN_TTL_DAYS};
use super::AuthUser;
use crate::http_error::AppError;

/// Login and token verification. Controllers depend on this, never on the
/// provider directly.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(provider: impl AuthProvider, jwt_secret: &str) -> Self {
        Self::with_tokens(Arc::new(provider), TokenService::new(jwt_secret, Duration::days(TOKEN_TTL_DAYS)))
    }

    pub fn with_tokens(provider: Arc<dyn AuthProvider>, tokens: TokenService) -> Self {
        Self { provider, tokens }
    }

    pub async fn login(&self, email: Option<String>, password: Option<String>) -> Result<LoginData, AppError> {
        let (Some(email), Some(password)) = (
            email.filter(|e| !e.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::missing_fields("Email and password are required"));
        };

        let Some(user) = self.provider.authenticate(&email, &password).await else {
            tracing::info!("rejected login attempt");
            return Err(AppError::invalid_credentials());
        };

        let token = self.tokens.issue(&user)?;
        tracing::info!(user = %user.id, "login succeeded");
        Ok(LoginData { user, token })
    }

    /// `None` means the request carried no bearer token at all.
    pub fn verify_token(&self, token: Option<&str>) -> Result<AuthUser, AppError> {
        let token = token.ok_or_else(AppError::unauthorized)?;
        let Claims { id, email, name, role, .. } = self.tokens.verify(token)?;
        Ok(AuthUser { id, email, name, role })
    }
}
