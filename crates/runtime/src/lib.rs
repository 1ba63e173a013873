//! Session runtime for the gameplay ability system.
//!
//! A [`Session`] hosts every player's authoritative ability system next to
//! the predicting copy on that player's client, connects the two through a
//! latency-simulating [`NetLink`], and publishes what happens on a
//! topic-based [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the tick loop and player lifecycle
//! - [`game_mode`] activates and revokes game features
//! - [`link`] carries encoded net requests and replicated state
//! - [`events`] provides topic-based event routing
//! - [`teams`] balances players across teams
pub mod config;
pub mod error;
pub mod events;
pub mod game_mode;
pub mod link;
pub mod player;
pub mod session;
pub mod teams;

pub use config::SessionConfig;
pub use error::{Result, RuntimeError};
pub use events::{Event, EventBus, Peer, PlayerEvent, TeamEvent, Topic};
pub use game_mode::GameModeLifecycle;
pub use link::{Delivery, Direction, LinkPayload, NetLink};
pub use player::{InitState, Player};
pub use session::Session;
pub use teams::TeamRegistry;
