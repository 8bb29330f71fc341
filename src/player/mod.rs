pub mod context;
pub mod session;
pub mod state;
pub mod timer;
pub mod transport;

pub use context::PlayerContext;
pub use session::PlaybackSession;
pub use state::*;
pub use timer::Timer;
pub use transport::{CompletionHandle, Transport};
