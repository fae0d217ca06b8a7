//! Validation of operator-chosen public ids.

use std::sync::Arc;

use redirect_state::RedirectStore;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{RegistryError, RegistryResult};

const ALIAS_PATTERN: &str = r"^[0-9a-zA-Z_-]+$";

/// Why a custom alias was refused before availability was considered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasRejection {
    #[error("Custom addresses must contain only letters, numbers, hyphens, and underscores")]
    InvalidCharacters,

    #[error("Custom addresses may not begin with \"{prefix}\"")]
    ReservedPrefix { prefix: String },
}

pub struct AliasValidator {
    store: Arc<dyn RedirectStore>,
    reserved_prefix: String,
    pattern: Regex,
}

impl AliasValidator {
    pub fn new(store: Arc<dyn RedirectStore>, reserved_prefix: impl Into<String>) -> Self {
        Self {
            store,
            reserved_prefix: reserved_prefix.into(),
            pattern: Regex::new(ALIAS_PATTERN).expect("alias pattern is a valid regex"),
        }
    }

    /// Syntax checks only: character set, then reserved prefix.
    pub fn validate(&self, candidate: &str) -> Result<(), AliasRejection> {
        if !self.pattern.is_match(candidate) {
            return Err(AliasRejection::InvalidCharacters);
        }
        if !self.reserved_prefix.is_empty() && candidate.starts_with(&self.reserved_prefix) {
            return Err(AliasRejection::ReservedPrefix {
                prefix: self.reserved_prefix.clone(),
            });
        }
        Ok(())
    }

    /// True iff no entry currently uses `candidate` as its public id.
    ///
    /// A failed lookup counts as unavailable.
    pub fn is_available(&self, candidate: &str) -> bool {
        match self.store.find_by_public_id(candidate) {
            Ok(lookup) => lookup.is_missing(),
            Err(e) => {
                warn!(%candidate, error = %e, "availability lookup failed, treating as taken");
                false
            }
        }
    }

    /// Full check: syntax, then availability.
    pub fn check(&self, candidate: &str) -> RegistryResult<()> {
        if let Err(rejection) = self.validate(candidate) {
            debug!(%candidate, %rejection, "custom alias rejected");
            return Err(rejection.into());
        }
        if !self.is_available(candidate) {
            return Err(RegistryError::AliasUnavailable(candidate.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redirect_core::RedirectEntry;
    use redirect_state::{StateStore, WriteCondition};

    use crate::test_support::FailingStore;

    fn validator() -> (StateStore, AliasValidator) {
        let store = StateStore::open_in_memory("FoundryRedirects").unwrap();
        let validator = AliasValidator::new(Arc::new(store.clone()), "api");
        (store, validator)
    }

    #[test]
    fn rejects_reserved_prefix() {
        let (_, v) = validator();
        assert_eq!(
            v.validate("api-west"),
            Err(AliasRejection::ReservedPrefix {
                prefix: "api".to_string()
            })
        );
        assert!(matches!(
            v.check("apiary"),
            Err(RegistryError::InvalidAlias(AliasRejection::ReservedPrefix { .. }))
        ));
    }

    #[test]
    fn rejects_illegal_characters() {
        let (_, v) = validator();
        assert_eq!(v.validate("foo bar!"), Err(AliasRejection::InvalidCharacters));
        assert_eq!(v.validate("a/b"), Err(AliasRejection::InvalidCharacters));
        assert_eq!(v.validate("é"), Err(AliasRejection::InvalidCharacters));
        assert_eq!(v.validate(""), Err(AliasRejection::InvalidCharacters));
    }

    #[test]
    fn character_check_runs_before_prefix_check() {
        let (_, v) = validator();
        assert_eq!(v.validate("api west"), Err(AliasRejection::InvalidCharacters));
    }

    #[test]
    fn accepts_unused_alias_then_rejects_once_taken() {
        let (store, v) = validator();
        assert!(v.check("foo-bar_1").is_ok());

        let entry = RedirectEntry::new("foo-bar_1", "host-1", "ext", "loc");
        store.upsert(&entry, WriteCondition::Absent).unwrap();

        assert!(v.validate("foo-bar_1").is_ok());
        assert!(!v.is_available("foo-bar_1"));
        assert!(matches!(
            v.check("foo-bar_1"),
            Err(RegistryError::AliasUnavailable(id)) if id == "foo-bar_1"
        ));
    }

    #[test]
    fn storage_error_counts_as_taken() {
        let v = AliasValidator::new(Arc::new(FailingStore), "api");
        assert!(v.validate("free-alias").is_ok());
        assert!(!v.is_available("free-alias"));
        assert!(matches!(
            v.check("free-alias"),
            Err(RegistryError::AliasUnavailable(id)) if id == "free-alias"
        ));
    }

    #[test]
    fn empty_prefix_reserves_nothing() {
        let store = StateStore::open_in_memory("FoundryRedirects").unwrap();
        let v = AliasValidator::new(Arc::new(store), "");
        assert!(v.validate("api-west").is_ok());
    }
}
