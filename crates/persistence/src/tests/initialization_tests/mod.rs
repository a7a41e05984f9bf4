// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.

use std::path::PathBuf;

use super::{NOW, create_test_material, create_test_persistence, create_test_student};
use crate::{
    KeyValueStore, MemoryKeyValueStore, Persistence, PersistenceError, USERS_KEY,
};

#[test]
fn test_persistence_initialization() {
    let result: Result<Persistence, PersistenceError> = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1: Persistence = create_test_persistence();
    let mut db2: Persistence = create_test_persistence();

    db1.save_account(&create_test_student("STD-1", "a.b")).unwrap();

    assert_eq!(db1.list_accounts().unwrap().len(), 1);
    assert!(db2.list_accounts().unwrap().is_empty(), "db2 should be isolated");
}

#[test]
fn test_empty_store_reads_as_empty_collections() {
    let mut persistence: Persistence = create_test_persistence();
    assert!(persistence.list_accounts().unwrap().is_empty());
    assert!(persistence.list_materials().unwrap().is_empty());
    assert!(persistence.audit_trail().unwrap().is_empty());
    assert!(persistence.list_delivery_logs().unwrap().is_empty());
}

#[test]
fn test_file_database_survives_reopen() {
    let path: PathBuf = std::env::temp_dir().join(format!(
        "studyq-persistence-test-{}.db",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    {
        let mut persistence: Persistence = Persistence::new_with_file(&path).unwrap();
        persistence.save_material(&create_test_material("MAT-1")).unwrap();
    }

    let mut reopened: Persistence = Persistence::new_with_file(&path).unwrap();
    assert!(reopened.get_material("MAT-1").unwrap().is_some());

    drop(reopened);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

#[test]
fn test_memory_store_backs_persistence() {
    let mut persistence: Persistence = Persistence::with_store(Box::new(MemoryKeyValueStore::new()));
    persistence.set_password_cost(crate::MIN_PASSWORD_COST);
    persistence.seed_demo_data(NOW).unwrap();
    assert_eq!(persistence.list_accounts().unwrap().len(), 4);
}

#[test]
fn test_memory_store_get_and_set() {
    let mut store: MemoryKeyValueStore = MemoryKeyValueStore::new();
    assert!(store.is_empty());
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "v1").unwrap();
    store.set("k", "v2").unwrap();

    assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_corrupt_collection_is_a_serialization_error() {
    let mut store: MemoryKeyValueStore = MemoryKeyValueStore::new();
    store.set(USERS_KEY, "{not json").unwrap();
    let mut persistence: Persistence = Persistence::with_store(Box::new(store));

    let err: PersistenceError = persistence.list_accounts().unwrap_err();
    assert!(matches!(err, PersistenceError::SerializationError(_)));
}

#[test]
fn test_password_cost_is_clamped() {
    let mut persistence: Persistence = create_test_persistence();
    persistence.set_password_cost(1);
    let hash: String = persistence.hash_password("secret").unwrap();
    assert!(hash.starts_with("$2b$04$"));
}
