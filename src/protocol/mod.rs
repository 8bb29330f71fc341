pub mod events;
pub mod tracks;

pub use events::{SessionEvent, TrackEndReason, TrackException};
pub use tracks::Track;
