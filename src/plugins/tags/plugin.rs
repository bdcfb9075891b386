use async_trait::async_trait;
use axum::routing::{get, post, put};
use axum::{middleware, Extension, Router};

use super::handlers::*;
use crate::kernel::Plugin;
use crate::plugins::auth::middleware::require_auth;
use crate::plugins::auth::AuthService;
use crate::store::DynStore;

pub struct TagsPlugin {
    store: DynStore,
    auth: AuthService,
}

impl TagsPlugin {
    pub fn new(store: DynStore, auth: AuthService) -> Self {
        Self { store, auth }
    }
}

#[async_trait]
impl Plugin for TagsPlugin {
    async fn router(&self) -> Router {
        let protected = Router::new()
            .route("/", post(create_tag))
            .route("/:id", put(update_tag).delete(delete_tag))
            .route_layer(middleware::from_fn_with_state(self.auth.clone(), require_auth));

        Router::new()
            .route("/", get(list_tags))
            .merge(protected)
            .layer(Extension(self.store.clone()))
    }

    fn name(&self) -> &'static str {
        "tags"
    }
}
