//! Domain types shared by the store, registry, and API crates.

use serde::{Deserialize, Serialize};

/// Externally resolvable identifier: a generated UUID or a custom alias.
pub type PublicId = String;

/// Stable identifier supplied by a registering foundry host.
pub type FoundryId = String;

/// One registered foundry instance and where to reach it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedirectEntry {
    pub public_id: PublicId,
    pub foundry_id: FoundryId,
    /// Address reachable from the public internet.
    pub external_address: String,
    /// Address reachable only from the host's local network.
    pub local_address: String,
}

impl RedirectEntry {
    pub fn new(
        public_id: impl Into<PublicId>,
        foundry_id: impl Into<FoundryId>,
        external_address: impl Into<String>,
        local_address: impl Into<String>,
    ) -> Self {
        Self {
            public_id: public_id.into(),
            foundry_id: foundry_id.into(),
            external_address: external_address.into(),
            local_address: local_address.into(),
        }
    }

    /// Key this entry is stored under.
    pub fn table_key(&self) -> &str {
        &self.foundry_id
    }

    /// The address to hand out for the requested locality.
    pub fn address(&self, want_local: bool) -> &str {
        if want_local {
            &self.local_address
        } else {
            &self.external_address
        }
    }
}
