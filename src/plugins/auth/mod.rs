pub mod handlers;
pub mod middleware;
pub mod models;
pub mod plugin;
pub mod provider;
pub mod service;
pub mod token;

pub use handlers::AuthUser;
pub use plugin::AuthPlugin;
pub use provider::{AdminCredentials, AuthProvider, StaticAdminProvider};
pub use service::AuthService;
