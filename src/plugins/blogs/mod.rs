pub mod handlers;
pub mod images;
pub mod models;
pub mod plugin;
pub mod populate;

pub use plugin::BlogsPlugin;
