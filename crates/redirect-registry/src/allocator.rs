//! Public id allocation.
//!
//! Ids are time-ordered UUID v1 values. A generated id is only handed out
//! once the store confirms no entry holds it; the number of candidates is
//! capped so a degenerate generator cannot spin forever.

use std::sync::Arc;

use redirect_state::RedirectStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};

/// Source of candidate public ids.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// UUID v1 generator with a fixed node id.
#[derive(Debug, Clone)]
pub struct UuidV1Generator {
    node_id: [u8; 6],
}

impl UuidV1Generator {
    pub fn new(node_id: [u8; 6]) -> Self {
        Self { node_id }
    }

    /// Random node id with the multicast bit set, so it can never collide
    /// with a real IEEE 802 address.
    pub fn random() -> Self {
        let mut node_id = [0u8; 6];
        node_id.copy_from_slice(&Uuid::new_v4().as_bytes()[..6]);
        node_id[0] |= 0x01;
        Self { node_id }
    }

    pub fn node_id(&self) -> [u8; 6] {
        self.node_id
    }
}

impl IdGenerator for UuidV1Generator {
    fn generate(&self) -> String {
        Uuid::now_v1(&self.node_id).to_string()
    }
}

/// Allocates public ids that are not yet present in the store.
pub struct IdAllocator {
    store: Arc<dyn RedirectStore>,
    generator: Box<dyn IdGenerator>,
    max_attempts: u32,
}

impl IdAllocator {
    pub fn new(
        store: Arc<dyn RedirectStore>,
        generator: Box<dyn IdGenerator>,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Generate a public id no existing entry uses.
    ///
    /// Storage errors abort allocation immediately; they are not counted
    /// as collisions.
    pub fn allocate(&self) -> RegistryResult<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generator.generate();
            if self.store.find_by_public_id(&candidate)?.is_missing() {
                debug!(%candidate, attempt, "public id allocated");
                return Ok(candidate);
            }
            warn!(%candidate, attempt, "generated public id already in use");
        }
        Err(RegistryError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}
