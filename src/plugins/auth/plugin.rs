use async_trait::async_trait;
use axum::routing::{get, post};
use axum::{middleware, Extension, Router};

use super::handlers;
use super::middleware::require_auth;
use super::service::AuthService;
use crate::kernel::Plugin;

pub struct AuthPlugin {
    auth: AuthService,
}

impl AuthPlugin {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Plugin for AuthPlugin {
    async fn router(&self) -> Router {
        let public = Router::new()
            .route("/login", post(handlers::login))
            .route("/logout", post(handlers::logout));

        let protected = Router::new()
            .route("/verify", get(handlers::verify))
            .route("/profile", get(handlers::profile))
            .route_layer(middleware::from_fn_with_state(self.auth.clone(), require_auth));

        public.merge(protected).layer(Extension(self.auth.clone()))
    }

    fn name(&self) -> &'static str {
        "auth"
    }
}
