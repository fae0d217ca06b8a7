//! StateStore — redb-backed persistence for redirect entries.
//!
//! One table, keyed by foundry id, with JSON-serialized values. Public id
//! lookups are a scan-and-filter over the whole table. Writes may carry a
//! [`WriteCondition`] that is re-checked inside the write transaction;
//! redb serializes writers, so a failed check is a reliable conflict signal.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use redirect_core::RedirectEntry;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Result of looking up entries by public id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicIdLookup {
    Missing,
    Found(RedirectEntry),
    /// More than one row carries the id. Never expected; a data-integrity fault.
    Ambiguous(Vec<RedirectEntry>),
}

impl PublicIdLookup {
    fn from_matches(mut matches: Vec<RedirectEntry>) -> Self {
        match matches.len() {
            0 => Self::Missing,
            1 => Self::Found(matches.remove(0)),
            _ => Self::Ambiguous(matches),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Precondition checked against the stored row before an upsert lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// Write blindly. Skips the public id uniqueness check as well.
    Unconditional,
    /// No row may exist yet for the entry's foundry id.
    Absent,
    /// The existing row must still carry this public id.
    PublicId(String),
}

/// Storage contract the registry is written against.
pub trait RedirectStore: Send + Sync {
    /// All rows whose public id equals `public_id`.
    fn find_by_public_id(&self, public_id: &str) -> StateResult<PublicIdLookup>;

    /// The row keyed by `foundry_id`, if any.
    fn find_by_foundry_id(&self, foundry_id: &str) -> StateResult<Option<RedirectEntry>>;

    /// Insert or replace the row for `entry.foundry_id`.
    ///
    /// Conditional writes fail with [`StateError::Conflict`] when the
    /// condition does not hold, or when the entry would take a public id
    /// already held by another row.
    fn upsert(&self, entry: &RedirectEntry, condition: WriteCondition) -> StateResult<()>;

    /// Every stored row, in key order.
    fn list_entries(&self) -> StateResult<Vec<RedirectEntry>>;
}

/// Thread-safe entry store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
    table: Arc<str>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path, table: &str) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            table: Arc::from(table),
        };
        store.ensure_table()?;
        debug!(?path, table, "redirect store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing and `--in-memory`).
    pub fn open_in_memory(table: &str) -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            table: Arc::from(table),
        };
        store.ensure_table()?;
        debug!(table, "in-memory redirect store opened");
        Ok(store)
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn ensure_table(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(tables::redirects(&self.table))
            .map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> StateResult<RedirectEntry> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}

/// Scan `table` for rows holding `public_id`.
fn scan_public_id<T>(table: &T, public_id: &str) -> StateResult<Vec<RedirectEntry>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut matches = Vec::new();
    for row in table.iter().map_err(map_err!(Read))? {
        let (_, value) = row.map_err(map_err!(Read))?;
        let entry = decode(value.value())?;
        if entry.public_id == public_id {
            matches.push(entry);
        }
    }
    Ok(matches)
}

fn check_condition(
    current: Option<&RedirectEntry>,
    condition: &WriteCondition,
    foundry_id: &str,
) -> StateResult<()> {
    match (condition, current) {
        (WriteCondition::Unconditional, _) | (WriteCondition::Absent, None) => Ok(()),
        (WriteCondition::Absent, Some(_)) => Err(StateError::Conflict(format!(
            "entry for {foundry_id} already exists"
        ))),
        (WriteCondition::PublicId(expected), Some(row)) if &row.public_id == expected => Ok(()),
        (WriteCondition::PublicId(expected), Some(row)) => Err(StateError::Conflict(format!(
            "entry for {foundry_id} changed from {expected} to {}",
            row.public_id
        ))),
        (WriteCondition::PublicId(_), None) => Err(StateError::Conflict(format!(
            "entry for {foundry_id} disappeared"
        ))),
    }
}

impl RedirectStore for StateStore {
    fn find_by_public_id(&self, public_id: &str) -> StateResult<PublicIdLookup> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn
            .open_table(tables::redirects(&self.table))
            .map_err(map_err!(Table))?;
        let matches = scan_public_id(&table, public_id)?;
        Ok(PublicIdLookup::from_matches(matches))
    }

    fn find_by_foundry_id(&self, foundry_id: &str) -> StateResult<Option<RedirectEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn
            .open_table(tables::redirects(&self.table))
            .map_err(map_err!(Table))?;
        match table.get(foundry_id).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    fn upsert(&self, entry: &RedirectEntry, condition: WriteCondition) -> StateResult<()> {
        let key = entry.table_key();
        let value = serde_json::to_vec(entry).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn
                .open_table(tables::redirects(&self.table))
                .map_err(map_err!(Table))?;

            if condition != WriteCondition::Unconditional {
                let current = match table.get(key).map_err(map_err!(Read))? {
                    Some(guard) => Some(decode(guard.value())?),
                    None => None,
                };
                check_condition(current.as_ref(), &condition, key)?;

                let keeps_id = current
                    .as_ref()
                    .is_some_and(|row| row.public_id == entry.public_id);
                if !keeps_id {
                    let holders = scan_public_id(&table, &entry.public_id)?;
                    if holders.iter().any(|row| row.foundry_id != key) {
                        return Err(StateError::Conflict(format!(
                            "public id {} is already taken",
                            entry.public_id
                        )));
                    }
                }
            }

            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(foundry_id = key, public_id = %entry.public_id, "redirect entry stored");
        Ok(())
    }

    fn list_entries(&self) -> StateResult<Vec<RedirectEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn
            .open_table(tables::redirects(&self.table))
            .map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for row in table.iter().map_err(map_err!(Read))? {
            let (_, value) = row.map_err(map_err!(Read))?;
            results.push(decode(value.value())?);
        }
        Ok(results)
    }
}
