pub mod auth;
pub mod blogs;
pub mod categories;
pub mod health;
pub mod metrics;
pub mod shared;
pub mod site;
pub mod tags;

use crate::kernel::Plugin;
use crate::media::DynMediaHost;
use crate::store::DynStore;
use auth::{AuthPlugin, AuthService};
use blogs::BlogsPlugin;
use categories::CategoriesPlugin;
use health::HealthPlugin;
use tags::TagsPlugin;

/// Every API plugin, in mount order. Metrics is mounted separately by the kernel.
pub fn api_plugins(store: DynStore, media: DynMediaHost, auth: AuthService, environment: &str) -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(HealthPlugin::new(environment)),
        Box::new(AuthPlugin::new(auth.clone())),
        Box::new(BlogsPlugin::new(store.clone(), media, auth.clone())),
        Box::new(CategoriesPlugin::new(store.clone(), auth.clone())),
        Box::new(TagsPlugin::new(store, auth)),
    ]
}
