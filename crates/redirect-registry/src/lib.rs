//! redirect-registry — the registration and resolution logic.
//!
//! Everything here talks to storage through [`redirect_state::RedirectStore`]
//! and takes its settings from [`redirect_core::config::RegistryConfig`]:
//!
//! - [`IdAllocator`] hands out fresh UUID v1 public ids, skipping any
//!   already present in the store.
//! - [`AliasValidator`] vets operator-chosen public ids.
//! - [`Resolver`] maps a public id to the address a client should be sent to.
//! - [`Registry`] ties them together for the registration endpoints.

pub mod alias;
pub mod allocator;
pub mod error;
pub mod registry;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use alias::{AliasRejection, AliasValidator};
pub use allocator::{IdAllocator, IdGenerator, UuidV1Generator};
pub use error::{RegistryError, RegistryResult};
pub use registry::{Registration, Registry};
pub use resolver::{Resolver, normalize_address};
