//! Topic-based event bus for session events.
//!
//! Every gameplay message drained from the ability systems, plus the
//! session's own team and player lifecycle notifications, is published to
//! exactly one topic. Consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{Peer, PlayerEvent, TeamEvent};
