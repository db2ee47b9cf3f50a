//! libSQL-backed [`RecordStore`] (offline mode).
//!
//! Every logical table shares the `records` table; a row's columns are kept as
//! a JSON object in `row_json` and the integer primary key is exposed as `id`.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use licensee_shared::{LicenseeError, Result};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{ROW_ID_COLUMN, RecordStore, StoredRow, migrations, validate_identifier};

/// Local record database handle.
pub struct LocalStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

fn storage_err(e: impl std::fmt::Display) -> LicenseeError {
    LicenseeError::Store(e.to_string())
}

impl LocalStore {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LicenseeError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        LicenseeError::Store(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Number of rows stored under `table`.
    pub async fn count_rows(&self, table: &str) -> Result<u64> {
        validate_identifier("table", table)?;
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM records WHERE table_name = ?1",
                params![table],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(storage_err)? as u64),
            None => Ok(0),
        }
    }

    /// All rows under `table` whose `key` column equals `value`, oldest first.
    async fn select_matching(
        &self,
        table: &str,
        key: &str,
        value: &str,
        limit: Option<u32>,
    ) -> Result<Vec<StoredRow>> {
        validate_identifier("table", table)?;
        validate_identifier("column", key)?;
        let limit = limit.map(i64::from).unwrap_or(-1);

        let mut rows = if key == ROW_ID_COLUMN {
            let Ok(id) = value.parse::<i64>() else {
                return Ok(Vec::new());
            };
            self.conn
                .query(
                    "SELECT id, row_json FROM records
                     WHERE table_name = ?1 AND id = ?2
                     ORDER BY id LIMIT ?3",
                    params![table, id, limit],
                )
                .await
                .map_err(storage_err)?
        } else {
            self.conn
                .query(
                    "SELECT id, row_json FROM records
                     WHERE table_name = ?1 AND json_extract(row_json, ?2) = ?3
                     ORDER BY id LIMIT ?4",
                    params![table, format!("$.{key}"), value, limit],
                )
                .await
                .map_err(storage_err)?
        };

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let id: i64 = row.get(0).map_err(storage_err)?;
            let json: String = row.get(1).map_err(storage_err)?;
            results.push(decode_row(id, &json)?);
        }
        Ok(results)
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    #[instrument(skip(self))]
    async fn find_by_key(&self, table: &str, key: &str, value: &str) -> Result<Option<StoredRow>> {
        Ok(self
            .select_matching(table, key, value, Some(1))
            .await?
            .into_iter()
            .next())
    }

    #[instrument(skip_all, fields(table = %table))]
    async fn insert(&self, table: &str, row: &StoredRow) -> Result<StoredRow> {
        validate_identifier("table", table)?;
        let mut columns = row.clone();
        columns.remove(ROW_ID_COLUMN);
        let json = serde_json::to_string(&columns).map_err(storage_err)?;
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO records (table_name, row_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![table, json.as_str(), now.as_str(), now.as_str()],
            )
            .await
            .map_err(storage_err)?;

        let id = self.conn.last_insert_rowid();
        debug!(id, "inserted local record");
        columns.insert(ROW_ID_COLUMN.into(), Value::from(id));
        Ok(columns)
    }

    #[instrument(skip(self, row))]
    async fn update(
        &self,
        table: &str,
        key: &str,
        value: &str,
        row: &StoredRow,
    ) -> Result<StoredRow> {
        let matches = self.select_matching(table, key, value, None).await?;
        if matches.is_empty() {
            return Err(LicenseeError::Store(format!(
                "no rows in {table} matched {key} = {value}"
            )));
        }

        let now = Utc::now().to_rfc3339();
        let mut updated = Vec::with_capacity(matches.len());
        for mut existing in matches {
            let Some(id) = existing.remove(ROW_ID_COLUMN).and_then(|v| v.as_i64()) else {
                continue;
            };
            for (column, val) in row {
                if column != ROW_ID_COLUMN {
                    existing.insert(column.clone(), val.clone());
                }
            }
            let json = serde_json::to_string(&existing).map_err(storage_err)?;
            self.conn
                .execute(
                    "UPDATE records SET row_json = ?1, updated_at = ?2 WHERE id = ?3",
                    params![json.as_str(), now.as_str(), id],
                )
                .await
                .map_err(storage_err)?;
            existing.insert(ROW_ID_COLUMN.into(), Value::from(id));
            updated.push(existing);
        }

        debug!(rows = updated.len(), "updated local records");
        updated
            .into_iter()
            .next()
            .ok_or_else(|| LicenseeError::Store("update matched rows without ids".into()))
    }
}

/// Decode a `row_json` payload and attach its integer id.
fn decode_row(id: i64, json: &str) -> Result<StoredRow> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| LicenseeError::Store(format!("corrupt row {id}: {e}")))?;
    let Value::Object(mut row) = value else {
        return Err(LicenseeError::Store(format!(
            "corrupt row {id}: not a JSON object"
        )));
    };
    row.insert(ROW_ID_COLUMN.into(), Value::from(id));
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_id;
    use serde_json::json;
    use uuid::Uuid;

    /// Create a temp file store for testing.
    async fn test_store() -> LocalStore {
        let tmp = std::env::temp_dir().join(format!("licensee_test_{}.db", Uuid::now_v7()));
        LocalStore::open(&tmp).await.expect("open test db")
    }

    fn row(value: Value) -> StoredRow {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let store = test_store().await;
        assert_eq!(store.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("licensee_test_{}.db", Uuid::now_v7()));
        let s1 = LocalStore::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = LocalStore::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn insert_assigns_id_and_find_by_uid() {
        let store = test_store().await;
        let inserted = store
            .insert("licensees", &row(json!({"uid": "abc123", "brand_name": "Acme"})))
            .await
            .expect("insert");
        let id = row_id(&inserted).expect("id assigned");

        let found = store
            .find_by_key("licensees", "uid", "abc123")
            .await
            .expect("find")
            .expect("row present");
        assert_eq!(row_id(&found), Some(id.clone()));
        assert_eq!(found["brand_name"], "Acme");

        let by_id = store.find_by_key("licensees", "id", &id).await.unwrap();
        assert!(by_id.is_some());
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let store = test_store().await;
        assert!(store.find_by_key("licensees", "uid", "nope").await.unwrap().is_none());
        assert!(store.find_by_key("licensees", "id", "not-a-number").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tables_are_isolated() {
        let store = test_store().await;
        store
            .insert("licensees", &row(json!({"uid": "abc123"})))
            .await
            .unwrap();
        assert!(store.find_by_key("brands", "uid", "abc123").await.unwrap().is_none());
        assert_eq!(store.count_rows("brands").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_merges_columns_in_place() {
        let store = test_store().await;
        let inserted = store
            .insert(
                "licensees",
                &row(json!({"uid": "abc123", "brand_name": "Acme", "website": "https://acme.com"})),
            )
            .await
            .unwrap();
        let id = row_id(&inserted).unwrap();

        let updated = store
            .update("licensees", "id", &id, &row(json!({"brand_name": "Acme Co"})))
            .await
            .expect("update");
        assert_eq!(updated["brand_name"], "Acme Co");
        assert_eq!(updated["website"], "https://acme.com");
        assert_eq!(row_id(&updated), Some(id));
        assert_eq!(store.count_rows("licensees").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_without_match_is_error() {
        let store = test_store().await;
        let err = store
            .update("licensees", "uid", "ghost", &row(json!({"brand_name": "x"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn rejects_unsafe_keys() {
        let store = test_store().await;
        let result = store.find_by_key("licensees", "uid') OR 1=1 --", "x").await;
        assert!(matches!(result, Err(LicenseeError::Validation { .. })));
    }
}
