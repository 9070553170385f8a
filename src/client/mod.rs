pub mod events;
pub mod timers;
pub mod connection;
pub mod swarm;

pub use events::{BotEvent, CloseReason, EventHandler, EventCollector};
pub use timers::{Ticker, Timers};
pub use connection::{run_bot, Connection};
pub use swarm::{BotOutcome, ShutdownHandle, Swarm, SwarmOptions};
