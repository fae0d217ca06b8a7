//! redirect-state — entry store for the foundry redirect registry.
//!
//! Backed by [redb](https://docs.rs/redb). Entries are JSON-serialized into a
//! single table keyed by foundry id; lookups by public id scan the table.
//!
//! The registry only depends on the [`RedirectStore`] trait. [`StateStore`]
//! is the redb implementation and is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`), with an in-memory backend for tests.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::{PublicIdLookup, RedirectStore, StateStore, WriteCondition};
