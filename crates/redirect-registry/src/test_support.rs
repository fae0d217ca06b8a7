//! Store doubles for exercising storage failures and lost write races.

use redirect_core::RedirectEntry;
use redirect_state::{
    PublicIdLookup, RedirectStore, StateError, StateResult, StateStore, WriteCondition,
};

/// Every call fails as if the database were unreachable.
pub struct FailingStore;

impl RedirectStore for FailingStore {
    fn find_by_public_id(&self, _public_id: &str) -> StateResult<PublicIdLookup> {
        Err(StateError::Read("store unavailable".to_string()))
    }

    fn find_by_foundry_id(&self, _foundry_id: &str) -> StateResult<Option<RedirectEntry>> {
        Err(StateError::Read("store unavailable".to_string()))
    }

    fn upsert(&self, _entry: &RedirectEntry, _condition: WriteCondition) -> StateResult<()> {
        Err(StateError::Write("store unavailable".to_string()))
    }

    fn list_entries(&self) -> StateResult<Vec<RedirectEntry>> {
        Err(StateError::Read("store unavailable".to_string()))
    }
}

/// Reports every public id as free, then loses every write to a
/// concurrent writer.
pub struct RacingStore(pub StateStore);

impl RacingStore {
    pub fn new() -> Self {
        Self(StateStore::open_in_memory("FoundryRedirects").unwrap())
    }
}

impl RedirectStore for RacingStore {
    fn find_by_public_id(&self, _public_id: &str) -> StateResult<PublicIdLookup> {
        Ok(PublicIdLookup::Missing)
    }

    fn find_by_foundry_id(&self, foundry_id: &str) -> StateResult<Option<RedirectEntry>> {
        self.0.find_by_foundry_id(foundry_id)
    }

    fn upsert(&self, entry: &RedirectEntry, _condition: WriteCondition) -> StateResult<()> {
        Err(StateError::Conflict(format!("row {} changed underneath", entry.foundry_id)))
    }

    fn list_entries(&self) -> StateResult<Vec<RedirectEntry>> {
        self.0.list_entries()
    }
}
