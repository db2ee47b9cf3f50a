//! Record stores for enriched licensee rows.
//!
//! The pipeline writes through the [`RecordStore`] trait. Two backends exist:
//! - [`PostgrestStore`]: the hosted Supabase/PostgREST table (production)
//! - [`LocalStore`]: a libSQL file with the same contract (offline/dev)
//!
//! Rows are JSON objects keyed by column name. A stored row may carry the
//! backend-assigned `id` column alongside the caller's `uid`.

mod local;
mod migrations;
mod postgrest;

use std::sync::LazyLock;

use async_trait::async_trait;
use licensee_shared::{LicenseeError, Result};
use regex::Regex;
use serde_json::{Map, Value};

pub use local::LocalStore;
pub use postgrest::PostgrestStore;

/// A row as stored: column name to JSON value.
pub type StoredRow = Map<String, Value>;

/// Name of the backend-assigned row id column.
pub const ROW_ID_COLUMN: &str = "id";

/// Keyed lookup, insert, and update against a persistent table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the first row whose `key` column equals `value`.
    async fn find_by_key(&self, table: &str, key: &str, value: &str) -> Result<Option<StoredRow>>;

    /// Insert `row` and return it as stored.
    async fn insert(&self, table: &str, row: &StoredRow) -> Result<StoredRow>;

    /// Update rows whose `key` column equals `value`; returns the first updated row.
    async fn update(&self, table: &str, key: &str, value: &str, row: &StoredRow)
    -> Result<StoredRow>;
}

/// The backend-assigned id of a stored row, if present and non-null.
pub fn row_id(row: &StoredRow) -> Option<String> {
    match row.get(ROW_ID_COLUMN)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Plain SQL-style identifier (table or column name).
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

/// Reject table/column names that are not plain identifiers.
pub(crate) fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(LicenseeError::validation(format!(
            "invalid {kind} name '{name}'"
        )))
    }
}
