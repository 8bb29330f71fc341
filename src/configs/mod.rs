pub mod base;
pub mod logging;
pub mod lyrics;
pub mod player;
pub mod sources;

pub use base::*;
pub use logging::*;
pub use lyrics::*;
pub use player::*;
pub use sources::*;
