//! Script write operations: insert, update, delete.

use sqlx::{Row, Sqlite, Transaction};

use super::super::db::ScriptDb;
use super::super::types::{NewScript, ScriptId, ScriptSelection, ScriptUpdate, StoreError};
use crate::script_name::is_valid_script_name;

/// Map a UNIQUE violation on the name column to `NameTaken`.
fn name_conflict(err: sqlx::Error, name: &str) -> StoreError {
    let unique = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());
    if unique {
        StoreError::NameTaken(name.to_string())
    } else {
        StoreError::Database(err)
    }
}

fn check_name(name: &str) -> Result<(), StoreError> {
    if is_valid_script_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

impl ScriptDb {
    /// Insert a new script row. The human name must be a valid script name and
    /// not already catalogued.
    pub async fn insert(&self, script: &NewScript) -> Result<ScriptId, StoreError> {
        check_name(&script.human_name)?;

        let row_id = sqlx::query(
            r#"
            INSERT INTO scripts (script_uri, source_uri, class_name)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&script.human_name)
        .bind(&script.source_uri)
        .bind(&script.class_name)
        .execute(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &script.human_name))?
        .last_insert_rowid();

        tracing::debug!(id = row_id, name = %script.human_name, "inserted script");
        Ok(row_id)
    }

    /// Apply `changes` to the selected rows. A rename also moves the script's
    /// stored data; if that move fails nothing is changed.
    pub async fn update(
        &self,
        selection: &ScriptSelection,
        changes: &ScriptUpdate,
    ) -> Result<u64, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }
        if let Some(name) = &changes.human_name {
            check_name(name)?;
        }

        let mut tx = self.pool.begin().await?;

        let old_names: Vec<String> = if changes.human_name.is_some() {
            let select = format!(
                "SELECT script_uri FROM scripts WHERE {}",
                selection.where_clause()
            );
            selection
                .bind(sqlx::query(&select))
                .fetch_all(&mut *tx)
                .await?
                .iter()
                .map(|row| row.get("script_uri"))
                .collect()
        } else {
            Vec::new()
        };

        let sql = format!(
            r#"
            UPDATE scripts
            SET script_uri = COALESCE(?, script_uri),
                source_uri = COALESCE(?, source_uri),
                class_name = COALESCE(?, class_name)
            WHERE {}
            "#,
            selection.where_clause()
        );
        let query = sqlx::query(&sql)
            .bind(changes.human_name.as_deref())
            .bind(changes.source_uri.as_deref())
            .bind(changes.class_name.as_deref());
        let result = selection
            .bind(query)
            .execute(&mut *tx)
            .await
            .map_err(|e| name_conflict(e, changes.human_name.as_deref().unwrap_or_default()))?;

        let mut moved: Vec<(&str, &str)> = Vec::new();
        if let Some(new_name) = &changes.human_name {
            for old_name in old_names.iter().filter(|old| *old != new_name) {
                if let Err(e) = self.artifacts.rename(old_name, new_name) {
                    self.undo_renames(&moved);
                    rollback_quietly(tx).await;
                    return Err(e.into());
                }
                moved.push((old_name.as_str(), new_name.as_str()));
            }
        }

        if let Err(e) = tx.commit().await {
            self.undo_renames(&moved);
            return Err(e.into());
        }
        Ok(result.rows_affected())
    }

    /// Move renamed data back, newest first. Failures are logged.
    fn undo_renames(&self, moved: &[(&str, &str)]) {
        for (old_name, new_name) in moved.iter().rev() {
            if let Err(e) = self.artifacts.rename(new_name, old_name) {
                tracing::error!(
                    from = %new_name,
                    to = %old_name,
                    "could not move script data back: {}",
                    e
                );
            }
        }
    }

    /// Delete the selected rows together with their stored data.
    ///
    /// The data of every selected script is moved aside first and only
    /// deleted once the rows are gone. If any of it cannot be moved, nothing is
    /// deleted and `StoreError::Cleanup` names the script that failed.
    pub async fn delete(&self, selection: &ScriptSelection) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT script_uri FROM scripts WHERE {}",
            selection.where_clause()
        );
        let names: Vec<String> = selection
            .bind(sqlx::query(&select))
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(|row| row.get("script_uri"))
            .collect();

        let staged = match self.artifacts.stage_removal(&names) {
            Ok(staged) => staged,
            Err((name, source)) => {
                tracing::warn!(%name, "failed to remove script data: {}", source);
                rollback_quietly(tx).await;
                return Err(StoreError::Cleanup { name, source });
            }
        };

        let delete = format!("DELETE FROM scripts WHERE {}", selection.where_clause());
        let deleted = selection.bind(sqlx::query(&delete)).execute(&mut *tx).await;
        let committed = match deleted {
            Ok(result) => tx.commit().await.map(|()| result),
            Err(e) => {
                rollback_quietly(tx).await;
                Err(e)
            }
        };
        let result = match committed {
            Ok(result) => result,
            Err(e) => {
                staged.restore();
                return Err(e.into());
            }
        };

        if let Err(e) = staged.finish() {
            // Rows are gone; the data only lingers in the staging dir.
            tracing::warn!("could not remove staged script data: {}", e);
        }
        tracing::debug!(rows = result.rows_affected(), "deleted scripts");
        Ok(result.rows_affected())
    }
}

/// Roll back, keeping whatever error the caller is about to return.
async fn rollback_quietly(tx: Transaction<'_, Sqlite>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!("rollback failed: {}", e);
    }
}
