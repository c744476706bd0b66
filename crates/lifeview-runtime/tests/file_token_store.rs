//! File-backed reconnection token store.

use lifeview_runtime::token_store::{FileTokenStore, TokenStore, TokenStoreError};

#[test]
fn missing_file_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("token.json"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn stored_token_survives_a_new_store_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("token.json");

    let mut first = FileTokenStore::new(&path);
    first.store("secret-token").unwrap();
    assert!(path.exists());
    assert!(!path.with_file_name("token.json.tmp").exists());

    let second = FileTokenStore::new(&path);
    assert_eq!(second.load().unwrap().as_deref(), Some("secret-token"));
}

#[test]
fn clear_removes_file_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileTokenStore::new(dir.path().join("token.json"));
    store.store("t").unwrap();
    store.clear().unwrap();
    assert!(!store.path().exists());
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn corrupt_file_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    std::fs::write(&path, "{not json").unwrap();
    let store = FileTokenStore::new(&path);
    assert!(matches!(store.load(), Err(TokenStoreError::Json(_))));
}

#[test]
fn future_format_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    std::fs::write(&path, r#"{"format_version": 9, "token": "x"}"#).unwrap();
    let store = FileTokenStore::new(&path);
    assert!(matches!(
        store.load(),
        Err(TokenStoreError::UnsupportedVersion(9))
    ));
}
