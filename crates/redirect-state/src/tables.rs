//! redb table definitions for the redirect entry store.
//!
//! The table name comes from configuration, so definitions are built per
//! store rather than declared as constants. Keys are foundry ids; values
//! are JSON-serialized `RedirectEntry` rows.

use redb::TableDefinition;

/// Redirect entries keyed by `{foundry_id}`.
pub fn redirects(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}
