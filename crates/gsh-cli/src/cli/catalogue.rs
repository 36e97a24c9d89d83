//! Catalogue access for commands. Every operation goes through the query
//! handler; failures it forwards are reported and turned into errors.

use anyhow::{anyhow, Result};
use gsh_core::artifacts::ScriptArtifacts;
use gsh_core::config::GshConfig;
use gsh_core::query_handler::{OperationFailure, QueryCallbacks, QueryHandler, Token};
use gsh_core::script_db::{
    NewScript, ScriptDb, ScriptId, ScriptRecord, ScriptSelection, ScriptUpdate,
};

/// Results of the operations dispatched in one round.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub records: Vec<ScriptRecord>,
    pub inserted: Option<ScriptId>,
    pub rows: u64,
    pub failure: Option<String>,
}

impl QueryCallbacks<&'static str> for Collected {
    fn on_query_complete(&mut self, _token: Token, _cookie: &'static str, records: Vec<ScriptRecord>) {
        self.records = records;
    }

    fn on_insert_complete(&mut self, _token: Token, _cookie: &'static str, id: ScriptId) {
        self.inserted = Some(id);
    }

    fn on_update_complete(&mut self, _token: Token, _cookie: &'static str, rows: u64) {
        self.rows += rows;
    }

    fn on_delete_complete(&mut self, _token: Token, _cookie: &'static str, rows: u64) {
        self.rows += rows;
    }

    fn on_error(&mut self, token: Token, cookie: &'static str, error: OperationFailure) {
        tracing::error!(token, op = cookie, "catalogue operation failed: {}", error);
        self.failure = Some(format!("{cookie} failed: {error}"));
    }
}

pub(crate) struct Catalogue {
    db: ScriptDb,
    handler: QueryHandler<&'static str>,
    next_token: Token,
}

impl Catalogue {
    pub async fn open(cfg: &GshConfig) -> Result<Self> {
        let db = ScriptDb::open_default(cfg).await?;
        Ok(Self::with_db(db))
    }

    pub fn with_db(db: ScriptDb) -> Self {
        Self {
            handler: QueryHandler::new(db.clone()),
            db,
            next_token: 0,
        }
    }

    pub fn artifacts(&self) -> &ScriptArtifacts {
        self.db.artifacts()
    }

    fn token(&mut self) -> Token {
        self.next_token += 1;
        self.next_token
    }

    async fn collect(&mut self) -> Result<Collected> {
        let mut collected = Collected::default();
        self.handler.dispatch_all(&mut collected).await;
        match collected.failure.take() {
            Some(msg) => Err(anyhow!(msg)),
            None => Ok(collected),
        }
    }

    pub async fn list(&mut self) -> Result<Vec<ScriptRecord>> {
        let token = self.token();
        self.handler.start_query(token, "list", ScriptSelection::All);
        Ok(self.collect().await?.records)
    }

    pub async fn insert(&mut self, script: NewScript) -> Result<ScriptId> {
        let token = self.token();
        self.handler.start_insert(token, "insert", script);
        self.collect()
            .await?
            .inserted
            .ok_or_else(|| anyhow!("insert returned no id"))
    }

    /// Rows renamed (0 if `old` does not exist).
    pub async fn rename(&mut self, old: &str, new: &str) -> Result<u64> {
        let token = self.token();
        self.handler.start_update(
            token,
            "rename",
            ScriptSelection::Name(old.to_string()),
            ScriptUpdate::rename(new),
        );
        Ok(self.collect().await?.rows)
    }

    /// Rows removed along with their stored data.
    pub async fn remove(&mut self, selection: ScriptSelection) -> Result<u64> {
        let token = self.token();
        self.handler.start_delete(token, "remove", selection);
        Ok(self.collect().await?.rows)
    }

    pub async fn close(self) {
        self.handler.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsh_core::query_handler::PanicPayload;
    use gsh_core::script_db::StoreError;

    async fn catalogue(root: &std::path::Path) -> Catalogue {
        let artifacts = ScriptArtifacts::new(root.join("scripts"), root.join("cache"));
        let db = ScriptDb::open_at(root.join("scripts.db"), artifacts)
            .await
            .unwrap();
        Catalogue::with_db(db)
    }

    #[test]
    fn forwarded_failures_are_recorded_not_raised() {
        let mut c = Collected::default();
        c.on_error(
            1,
            "insert",
            OperationFailure::Store(StoreError::NameTaken("dup".to_string())),
        );
        assert!(c.failure.as_deref().unwrap().contains("insert failed"));

        c.on_error(
            2,
            "list",
            OperationFailure::Panicked(PanicPayload::new(Box::new("boom"))),
        );
        assert!(c.failure.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn insert_list_rename_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = catalogue(dir.path()).await;

        let id = cat
            .insert(NewScript::named("alpha", "file:///alpha.groovy"))
            .await
            .unwrap();
        let listed = cat.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        assert_eq!(cat.rename("alpha", "beta").await.unwrap(), 1);
        assert_eq!(cat.rename("missing", "gamma").await.unwrap(), 0);
        assert_eq!(
            cat.remove(ScriptSelection::Name("beta".to_string()))
                .await
                .unwrap(),
            1
        );
        assert!(cat.list().await.unwrap().is_empty());
        cat.close().await;
    }

    #[tokio::test]
    async fn duplicate_insert_becomes_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = catalogue(dir.path()).await;
        cat.insert(NewScript::named("same", "file:///a")).await.unwrap();
        let err = cat
            .insert(NewScript::named("same", "file:///b"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err:#}");
    }
}
