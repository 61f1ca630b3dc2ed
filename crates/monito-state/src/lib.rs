//! monito-state — service store for the MonitoCorp status dashboard.
//!
//! Holds the catalog of monitored services behind the [`ServiceRepository`]
//! trait. The bundled [`StateStore`] keeps records in an in-memory
//! [redb](https://docs.rs/redb) database, so nothing survives a restart.
//!
//! # Architecture
//!
//! Service records are JSON-serialized into a table keyed by insertion
//! sequence, which makes `list` return services in creation order. A second
//! table maps the public id to that sequence. Every mutation runs in a single
//! write transaction, so a read never observes a half-applied change.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod repository;
pub mod seed;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use repository::ServiceRepository;
pub use store::StateStore;
pub use types::*;
