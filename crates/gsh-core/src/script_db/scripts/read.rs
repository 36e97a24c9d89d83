//! Script read operations: query and lookup by name.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::super::db::ScriptDb;
use super::super::types::{ScriptRecord, ScriptSelection, StoreError};

pub(crate) fn record_from_row(row: &SqliteRow) -> ScriptRecord {
    ScriptRecord {
        id: row.get("_id"),
        human_name: row.get("script_uri"),
        source_uri: row.get("source_uri"),
        class_name: row.get("class_name"),
    }
}

impl ScriptDb {
    /// Rows matching `selection`, oldest first.
    pub async fn query(&self, selection: &ScriptSelection) -> Result<Vec<ScriptRecord>, StoreError> {
        let sql = format!(
            r#"
            SELECT _id, script_uri, source_uri, class_name
            FROM scripts
            WHERE {}
            ORDER BY _id ASC
            "#,
            selection.where_clause()
        );
        let rows = selection
            .bind(sqlx::query(&sql))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Fetch a single script by its human name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<ScriptRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT _id, script_uri, source_uri, class_name
            FROM scripts
            WHERE script_uri = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }
}
