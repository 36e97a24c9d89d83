//! Integration test: derive a name, read the source, store it and catalogue it
//! through the query handler, against an on-disk catalogue.

mod common;

use std::fs;

use gsh_core::artifacts::ScriptArtifacts;
use gsh_core::query_handler::{OperationFailure, QueryCallbacks, QueryHandler, Token};
use gsh_core::resolver::DirectoryResolver;
use gsh_core::script_db::{
    NewScript, ScriptDb, ScriptId, ScriptRecord, ScriptSelection, ScriptUpdate, StoreError,
};
use gsh_core::script_name::derive_name;
use gsh_core::source::{open_source, SourceOptions};
use tempfile::tempdir;
use url::Url;

#[derive(Default)]
struct Collect {
    inserted: Vec<ScriptId>,
    listed: Vec<ScriptRecord>,
    updated: u64,
    deleted: u64,
    errors: Vec<String>,
}

impl QueryCallbacks<()> for Collect {
    fn on_query_complete(&mut self, _token: Token, _cookie: (), records: Vec<ScriptRecord>) {
        self.listed = records;
    }

    fn on_insert_complete(&mut self, _token: Token, _cookie: (), id: ScriptId) {
        self.inserted.push(id);
    }

    fn on_update_complete(&mut self, _token: Token, _cookie: (), rows: u64) {
        self.updated += rows;
    }

    fn on_delete_complete(&mut self, _token: Token, _cookie: (), rows: u64) {
        self.deleted += rows;
    }

    fn on_error(&mut self, _token: Token, _cookie: (), error: OperationFailure) {
        self.errors.push(error.to_string());
    }
}

async fn open(root: &std::path::Path) -> ScriptDb {
    let artifacts = ScriptArtifacts::new(root.join("data/scripts"), root.join("cache"));
    ScriptDb::open_at(root.join("data/scripts.db"), artifacts)
        .await
        .unwrap()
}

#[tokio::test]
async fn content_uri_is_named_stored_and_catalogued() {
    let root = tempdir().unwrap();
    let content = root.path().join("content");
    fs::create_dir_all(content.join("downloads")).unwrap();
    fs::write(content.join("downloads/Hello World.groovy"), b"println 'hello'").unwrap();

    let uri = Url::parse("content://downloads/Hello%20World.groovy").unwrap();
    let resolver = DirectoryResolver::new(&content);
    let name = derive_name(&uri, Some(&resolver));
    assert_eq!(name, "Hello_World");

    let bytes = open_source(&uri, &resolver, &SourceOptions::default()).unwrap();
    let db = open(root.path()).await;
    let stored = db.artifacts().store_source(&name, &bytes).unwrap();
    assert_eq!(fs::read(&stored).unwrap(), b"println 'hello'");

    let mut handler: QueryHandler<()> = QueryHandler::new(db.clone());
    let mut cb = Collect::default();
    handler.start_insert(1, (), NewScript::named(&name, uri.as_str()));
    handler.start_insert(2, (), NewScript::named(&name, uri.as_str()));
    handler.start_query(3, (), ScriptSelection::All);
    handler.dispatch_all(&mut cb).await;

    assert_eq!(cb.inserted.len(), 1);
    assert_eq!(cb.errors.len(), 1, "{:?}", cb.errors);
    assert!(cb.errors[0].contains("Hello_World"));
    assert_eq!(cb.listed.len(), 1);
    assert_eq!(cb.listed[0].human_name, "Hello_World");
    assert_eq!(cb.listed[0].class_name, "Hello_World");
    assert_eq!(cb.listed[0].source_uri, uri.as_str());
}

#[tokio::test]
async fn rename_then_delete_follows_artifacts() {
    let root = tempdir().unwrap();
    let db = open(root.path()).await;
    db.artifacts().store_source("first", b"1").unwrap();

    let mut handler: QueryHandler<()> = QueryHandler::new(db.clone());
    let mut cb = Collect::default();
    handler.start_insert(1, (), NewScript::named("first", "file:///first.groovy"));
    handler.start_update(
        2,
        (),
        ScriptSelection::Name("first".to_string()),
        ScriptUpdate::rename("second"),
    );
    handler.dispatch_all(&mut cb).await;
    assert_eq!(cb.updated, 1);
    assert!(!db.artifacts().script_dir("first").exists());
    assert_eq!(fs::read(db.artifacts().source_path("second")).unwrap(), b"1");

    handler.start_delete(3, (), ScriptSelection::Name("second".to_string()));
    handler.dispatch_all(&mut cb).await;
    assert_eq!(cb.deleted, 1);
    assert!(!db.artifacts().script_dir("second").exists());
    assert!(db.get_by_name("second").await.unwrap().is_none());
}

#[tokio::test]
async fn catalogue_survives_reopen() {
    let root = tempdir().unwrap();
    {
        let db = open(root.path()).await;
        db.insert(&NewScript::named("kept", "file:///kept.groovy"))
            .await
            .unwrap();
    }
    let db = open(root.path()).await;
    let kept = db.get_by_name("kept").await.unwrap().expect("row kept");
    assert_eq!(kept.source_uri, "file:///kept.groovy");
    assert!(matches!(
        db.insert(&NewScript::named("kept", "file:///again.groovy")).await,
        Err(StoreError::NameTaken(_))
    ));
}

#[tokio::test]
async fn http_source_is_fetched_and_named() {
    let base = common::script_server::start(b"def x = 42".to_vec());
    let resolver = DirectoryResolver::new("/nonexistent");

    let uri = Url::parse(&format!("{base}script.groovy")).unwrap();
    assert_eq!(derive_name(&uri, None), "script");

    let bytes = tokio::task::spawn_blocking({
        let uri = uri.clone();
        let resolver = resolver.clone();
        move || open_source(&uri, &resolver, &SourceOptions::default())
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(bytes, b"def x = 42");

    let moved = Url::parse(&format!("{base}moved")).unwrap();
    let bytes = open_source(&moved, &resolver, &SourceOptions::default()).unwrap();
    assert_eq!(bytes, b"def x = 42");

    let missing = Url::parse(&format!("{base}missing.groovy")).unwrap();
    let err = open_source(&missing, &resolver, &SourceOptions::default()).unwrap_err();
    assert!(err.to_string().contains("404"), "{err:#}");
}
