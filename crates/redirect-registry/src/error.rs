//! Registry error types.

use redirect_core::ConfigError;
use redirect_state::StateError;
use thiserror::Error;

use crate::alias::AliasRejection;

/// Errors that can occur while registering, customizing, or resolving.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{0} cannot be used as a redirect location")]
    InvalidAddress(&'static str),

    #[error(transparent)]
    InvalidAlias(#[from] AliasRejection),

    #[error("no foundry redirect found for {0}")]
    FoundryNotFound(String),

    #[error("no foundry server is registered with ID {0}")]
    PublicIdNotFound(String),

    #[error("multiple servers registered with ID {public_id}")]
    Ambiguous { public_id: String, count: usize },

    #[error("custom address {0} is not available")]
    AliasUnavailable(String),

    #[error("entry for {0} was modified concurrently")]
    Conflict(String),

    #[error("error generating unique redirect address after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("state store error: {0}")]
    Storage(#[from] StateError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
