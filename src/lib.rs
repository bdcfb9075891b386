pub mod config;
pub mod db;
pub mod http_error;
pub mod kernel;
pub mod media;
pub mod plugins;
pub mod slug;
pub mod store;

pub use crate::kernel::*;
pub use crate::db::*;
