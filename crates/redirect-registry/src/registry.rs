//! Registration service.
//!
//! The only path that creates entries is [`Registry::register`]. Every
//! write is conditional on the row state read at the start of the
//! operation, so two racing requests surface as a conflict instead of a
//! silently duplicated public id.

use std::sync::Arc;

use http::HeaderValue;
use redirect_core::RedirectEntry;
use redirect_core::config::RegistryConfig;
use redirect_state::{RedirectStore, StateError, WriteCondition};
use tracing::{info, warn};

use crate::alias::AliasValidator;
use crate::allocator::{IdAllocator, IdGenerator, UuidV1Generator};
use crate::error::{RegistryError, RegistryResult};
use crate::resolver::{Resolver, normalize_address};

/// Outcome of [`Registry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub entry: RedirectEntry,
    /// True when this call created the entry.
    pub created: bool,
}

pub struct Registry {
    store: Arc<dyn RedirectStore>,
    allocator: IdAllocator,
    validator: AliasValidator,
    resolver: Resolver,
    public_base_url: Option<String>,
}

impl Registry {
    /// Build a registry using a UUID v1 generator configured from `config`.
    pub fn new(store: Arc<dyn RedirectStore>, config: &RegistryConfig) -> RegistryResult<Self> {
        let generator = match config.node_id_bytes()? {
            Some(node_id) => UuidV1Generator::new(node_id),
            None => UuidV1Generator::random(),
        };
        Ok(Self::with_generator(store, config, Box::new(generator)))
    }

    pub fn with_generator(
        store: Arc<dyn RedirectStore>,
        config: &RegistryConfig,
        generator: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            allocator: IdAllocator::new(store.clone(), generator, config.max_allocation_attempts),
            validator: AliasValidator::new(store.clone(), config.reserved_prefix.clone()),
            resolver: Resolver::new(store.clone()),
            public_base_url: config
                .public_base_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            store,
        }
    }

    /// Record the addresses for `foundry_id`, creating the entry on first use.
    ///
    /// Re-registration keeps the existing public id and overwrites both
    /// addresses.
    pub fn register(
        &self,
        foundry_id: &str,
        external_address: &str,
        local_address: &str,
    ) -> RegistryResult<Registration> {
        require("foundry_id", foundry_id)?;
        require("external_address", external_address)?;
        require("local_address", local_address)?;
        redirectable("external_address", external_address)?;
        redirectable("local_address", local_address)?;

        let (public_id, condition, created) = match self.store.find_by_foundry_id(foundry_id)? {
            Some(existing) => {
                let condition = WriteCondition::PublicId(existing.public_id.clone());
                (existing.public_id, condition, false)
            }
            None => (self.allocator.allocate()?, WriteCondition::Absent, true),
        };

        let entry = RedirectEntry::new(public_id, foundry_id, external_address, local_address);
        self.store.upsert(&entry, condition).map_err(|e| match e {
            StateError::Conflict(detail) => {
                warn!(%foundry_id, %detail, "registration lost a write race");
                RegistryError::Conflict(foundry_id.to_string())
            }
            other => other.into(),
        })?;

        info!(
            %foundry_id,
            public_id = %entry.public_id,
            created,
            "foundry registered"
        );
        Ok(Registration { entry, created })
    }

    /// Replace the public id of an already registered foundry.
    pub fn customize_alias(&self, foundry_id: &str, desired: &str) -> RegistryResult<RedirectEntry> {
        self.validator.check(desired)?;

        let mut entry = self
            .store
            .find_by_foundry_id(foundry_id)?
            .ok_or_else(|| RegistryError::FoundryNotFound(foundry_id.to_string()))?;
        let previous = std::mem::replace(&mut entry.public_id, desired.to_string());

        self.store
            .upsert(&entry, WriteCondition::PublicId(previous.clone()))
            .map_err(|e| match e {
                StateError::Conflict(detail) => {
                    warn!(%foundry_id, %desired, %detail, "alias claimed concurrently");
                    RegistryError::AliasUnavailable(desired.to_string())
                }
                other => other.into(),
            })?;

        info!(%foundry_id, %previous, public_id = %desired, "public id customized");
        Ok(entry)
    }

    /// The address form of the public id registered for `foundry_id`.
    pub fn lookup_address_summary(&self, foundry_id: &str) -> RegistryResult<String> {
        let entry = self
            .store
            .find_by_foundry_id(foundry_id)?
            .ok_or_else(|| RegistryError::FoundryNotFound(foundry_id.to_string()))?;
        Ok(self.public_id_to_address(&entry.public_id))
    }

    /// `{public_base_url}/{public_id}`, or the bare id without a base URL.
    pub fn public_id_to_address(&self, public_id: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{public_id}"),
            None => public_id.to_string(),
        }
    }

    pub fn resolve(&self, public_id: &str, want_local: bool) -> RegistryResult<String> {
        self.resolver.resolve(public_id, want_local)
    }

    pub fn check_alias(&self, candidate: &str) -> RegistryResult<()> {
        self.validator.check(candidate)
    }
}

fn require(field: &'static str, value: &str) -> RegistryResult<()> {
    if value.is_empty() {
        return Err(RegistryError::EmptyField(field));
    }
    Ok(())
}

/// The address, once normalized, must be usable as a `Location` header.
fn redirectable(field: &'static str, address: &str) -> RegistryResult<()> {
    if HeaderValue::try_from(normalize_address(address)).is_err() {
        return Err(RegistryError::InvalidAddress(field));
    }
    Ok(())
}
