pub mod deezer;
pub mod http;
pub mod manager;
pub mod plugin;

pub use manager::TrackCatalog;
pub use plugin::{Query, TrackSource};
