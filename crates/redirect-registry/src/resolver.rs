//! Public id → redirect address resolution.

use std::sync::{Arc, LazyLock};

use redirect_state::{PublicIdLookup, RedirectStore};
use regex::Regex;
use tracing::{debug, error};

use crate::error::{RegistryError, RegistryResult};

/// `scheme://` per RFC 3986. Requiring the slashes keeps `host:port` scheme-less.
static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme pattern is a valid regex")
});

/// Prefix `http://` unless the address already carries a `scheme://`.
pub fn normalize_address(address: &str) -> String {
    if SCHEME.is_match(address) {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn RedirectStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn RedirectStore>) -> Self {
        Self { store }
    }

    /// The address a client asking for `public_id` should be redirected to.
    pub fn resolve(&self, public_id: &str, want_local: bool) -> RegistryResult<String> {
        match self.store.find_by_public_id(public_id)? {
            PublicIdLookup::Missing => Err(RegistryError::PublicIdNotFound(public_id.to_string())),
            PublicIdLookup::Ambiguous(rows) => {
                let foundry_ids: Vec<&str> = rows.iter().map(|r| r.foundry_id.as_str()).collect();
                error!(%public_id, ?foundry_ids, "public id is held by multiple entries");
                Err(RegistryError::Ambiguous {
                    public_id: public_id.to_string(),
                    count: rows.len(),
                })
            }
            PublicIdLookup::Found(entry) => {
                let address = normalize_address(entry.address(want_local));
                debug!(%public_id, want_local, %address, "resolved redirect");
                Ok(address)
            }
        }
    }
}
