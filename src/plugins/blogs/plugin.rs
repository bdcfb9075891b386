use async_trait::async_trait;
use axum::routing::{get, post};
use axum::{middleware, Extension, Router};

use super::handlers;
use crate::kernel::Plugin;
use crate::media::DynMediaHost;
use crate::plugins::auth::middleware::require_auth;
use crate::plugins::auth::AuthService;
use crate::store::DynStore;

pub struct BlogsPlugin {
    store: DynStore,
    media: DynMediaHost,
    auth: AuthService,
}

impl BlogsPlugin {
    pub fn new(store: DynStore, media: DynMediaHost, auth: AuthService) -> Self {
        Self { store, media, auth }
    }
}

#[async_trait]
impl Plugin for BlogsPlugin {
    async fn router(&self) -> Router {
        // `/:key` is a slug for reads and an id for writes
        let public = Router::new()
            .route("/", get(handlers::list_blogs))
            .route("/featured", get(handlers::featured_blogs))
            .route("/trending", get(handlers::trending_blogs))
            .route("/admin/:id", get(handlers::get_blog_by_id))
            .route("/:key", get(handlers::get_blog_by_slug));

        let protected = Router::new()
            .route("/", post(handlers::create_blog))
            .route("/upload-images", post(handlers::upload_images))
            .route("/:key", axum::routing::put(handlers::update_blog).delete(handlers::delete_blog))
            .route_layer(middleware::from_fn_with_state(self.auth.clone(), require_auth));

        public
            .merge(protected)
            .layer(Extension(self.store.clone()))
            .layer(Extension(self.media.clone()))
    }

    fn name(&self) -> &'static str {
        "blogs"
    }
}
