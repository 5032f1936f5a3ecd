//! Topic-based event bus for lobby and room events.
//!
//! Events are best-effort notifications for observers such as a statistics
//! collector; players receive their own view through [`crate::ServerMessage`].

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{LobbyEvent, RoomEvent};
