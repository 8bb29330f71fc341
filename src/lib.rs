pub mod common;
pub mod configs;
pub mod lyrics;
pub mod player;
pub mod protocol;
pub mod server;
pub mod sources;
