//! SQLite-backed script catalogue.
//!
//! Handles connection and schema versioning. Row operations live in `scripts`.

use anyhow::Result;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions};
use sqlx::query::Query;
use sqlx::{Pool, Sqlite};
use std::path::Path;

use super::types::{ScriptSelection, StoreError};
use crate::artifacts::ScriptArtifacts;
use crate::config::GshConfig;

/// Database file name inside the data directory.
pub const DB_NAME: &str = "scripts.db";

/// Schema version kept in `PRAGMA user_version`. Any other stored version is
/// dropped and recreated.
pub const DB_VERSION: i64 = 3;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the script catalogue and the on-disk data its rows own.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct ScriptDb {
    pub(crate) pool: Pool<Sqlite>,
    pub(crate) artifacts: ScriptArtifacts,
}

impl ScriptDb {
    /// Open (or create) the catalogue under the configured data directory.
    pub async fn open_default(cfg: &GshConfig) -> Result<Self> {
        let data_dir = cfg.data_dir()?;
        let artifacts = ScriptArtifacts::new(data_dir.join("scripts"), cfg.cache_dir()?);
        let db = Self::open_at(data_dir.join(DB_NAME), artifacts).await?;
        Ok(db)
    }

    /// Open (or create) the catalogue at a specific path. Creates parent dirs if needed.
    pub async fn open_at(
        path: impl AsRef<Path>,
        artifacts: ScriptArtifacts,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await?;
        let db = ScriptDb { pool, artifacts };
        db.migrate().await?;
        tracing::debug!(path = %path.display(), "opened script catalogue");
        Ok(db)
    }

    pub fn artifacts(&self) -> &ScriptArtifacts {
        &self.artifacts
    }

    /// Stored schema version.
    pub async fn schema_version(&self) -> Result<i64, StoreError> {
        let version = sqlx::query_scalar::<_, i64>("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    pub(crate) async fn migrate(&self) -> Result<(), StoreError> {
        let version = self.schema_version().await?;
        if version == DB_VERSION {
            return Ok(());
        }

        if version != 0 {
            // Upgrade and downgrade both start over: rows and caches go.
            tracing::info!(from = version, to = DB_VERSION, "recreating script catalogue");
            sqlx::query("DROP TABLE IF EXISTS scripts")
                .execute(&self.pool)
                .await?;
            self.artifacts.clear_caches()?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scripts (
                _id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                script_uri TEXT NOT NULL UNIQUE,
                source_uri TEXT NOT NULL,
                class_name TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        // PRAGMA does not take bound parameters.
        sqlx::query(&format!("PRAGMA user_version = {DB_VERSION}"))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl ScriptSelection {
    pub(crate) fn where_clause(&self) -> &'static str {
        match self {
            ScriptSelection::All => "1 = 1",
            ScriptSelection::Id(_) => "_id = ?",
            ScriptSelection::Name(_) => "script_uri = ?",
        }
    }

    /// Bind the selection argument, if any, after the ones already bound.
    pub(crate) fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            ScriptSelection::All => query,
            ScriptSelection::Id(id) => query.bind(*id),
            ScriptSelection::Name(name) => query.bind(name.as_str()),
        }
    }
}

#[cfg(test)]
/// Open an in-memory catalogue for tests (no disk I/O for the rows).
pub(crate) async fn open_memory(artifacts: ScriptArtifacts) -> Result<ScriptDb> {
    // Single connection to avoid the pool handing back a different empty DB.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = ScriptDb { pool, artifacts };
    db.migrate().await?;
    Ok(db)
}
