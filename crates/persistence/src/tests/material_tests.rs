// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use studyq_domain::Material;

use super::{create_test_material, create_test_persistence};
use crate::{Persistence, PersistenceError};

#[test]
fn test_save_and_get_material() {
    let mut persistence: Persistence = create_test_persistence();
    let material: Material = create_test_material("MAT-1");
    persistence.save_material(&material).unwrap();

    assert_eq!(persistence.get_material("MAT-1").unwrap(), Some(material));
    assert_eq!(persistence.get_material("MAT-2").unwrap(), None);
}

#[test]
fn test_save_material_replaces_by_id() {
    let mut persistence: Persistence = create_test_persistence();
    let mut material: Material = create_test_material("MAT-1");
    persistence.save_material(&material).unwrap();
    material.is_active = false;
    persistence.save_material(&material).unwrap();

    let materials: Vec<Material> = persistence.list_materials().unwrap();
    assert_eq!(materials.len(), 1);
    assert!(!materials[0].is_active);
}

#[test]
fn test_increment_download_count() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .save_material(&create_test_material("MAT-1"))
        .unwrap();

    assert_eq!(persistence.increment_download_count("MAT-1").unwrap(), 1);
    assert_eq!(persistence.increment_download_count("MAT-1").unwrap(), 2);
    assert_eq!(
        persistence.get_material("MAT-1").unwrap().unwrap().download_count,
        2
    );
}

#[test]
fn test_increment_unknown_material() {
    let mut persistence: Persistence = create_test_persistence();
    assert_eq!(
        persistence.increment_download_count("nope").unwrap_err(),
        PersistenceError::MaterialNotFound(String::from("nope"))
    );
}

#[test]
fn test_delete_material() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .save_material(&create_test_material("MAT-1"))
        .unwrap();
    persistence
        .save_material(&create_test_material("MAT-2"))
        .unwrap();

    assert!(persistence.delete_material("MAT-1").unwrap());
    assert!(!persistence.delete_material("MAT-1").unwrap());

    let ids: Vec<String> = persistence
        .list_materials()
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![String::from("MAT-2")]);
}
