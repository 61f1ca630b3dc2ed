//! monito-sim — synthetic telemetry for the MonitoCorp dashboard.
//!
//! There is no real probing behind the dashboard. This crate fakes the two
//! kinds of live data it shows:
//!
//! - [`simulator`]: per-read status flapping and response times layered over
//!   stored service records.
//! - [`events`]: a 50-event status history per service, paginated newest first.
//!
//! Every randomized function takes an explicit `rand::Rng`, so tests drive
//! them with a seeded `StdRng`. The stateful wrappers ([`Simulator`],
//! [`EventLog`]) own their generator behind a mutex and can be shared across
//! request handlers.

pub mod events;
pub mod simulator;

pub use events::{EVENT_POOL_SIZE, EventLog, generate_events, generate_pool};
pub use simulator::{Simulator, random_status, simulate};
