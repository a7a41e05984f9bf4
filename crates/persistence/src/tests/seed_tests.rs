// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use studyq_domain::{Account, Material, Role};

use super::{NOW, create_test_persistence, create_test_student};
use crate::{DEMO_TEACHER_ID, Persistence, SeedSummary};

#[test]
fn test_seed_populates_empty_stores() {
    let mut persistence: Persistence = create_test_persistence();
    let summary: SeedSummary = persistence.seed_demo_data(NOW).unwrap();

    assert_eq!(summary.accounts_seeded, 4);
    assert_eq!(summary.materials_seeded, 3);

    let admin: Account = persistence.get_account_by_username("admin").unwrap().unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert!(!admin.must_change_password);
    assert!(Persistence::verify_password("admin123", admin.password_hash.as_deref().unwrap()).unwrap());

    let jane: Account = persistence
        .get_account_by_username("jane.smith")
        .unwrap()
        .unwrap();
    let profile = jane.student.unwrap();
    assert_eq!((profile.academic_year, profile.current_semester), (2024, 5));
    assert_eq!(profile.whatsapp_number.as_deref(), Some("+1234567891"));

    let materials: Vec<Material> = persistence.list_materials().unwrap();
    assert!(materials.iter().all(|m| m.uploaded_by == DEMO_TEACHER_ID));
    assert_eq!(
        materials.iter().map(|m| m.download_count).sum::<u64>(),
        45 + 32 + 28
    );
}

#[test]
fn test_seed_is_idempotent() {
    let mut persistence: Persistence = create_test_persistence();
    persistence.seed_demo_data(NOW).unwrap();
    let second: SeedSummary = persistence.seed_demo_data(NOW).unwrap();

    assert_eq!(second, SeedSummary::default());
    assert_eq!(persistence.list_accounts().unwrap().len(), 4);
}

#[test]
fn test_seed_leaves_existing_accounts_alone() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .save_account(&create_test_student("STD-9", "only.one"))
        .unwrap();

    let summary: SeedSummary = persistence.seed_demo_data(NOW).unwrap();

    assert_eq!(summary.accounts_seeded, 0);
    assert_eq!(summary.materials_seeded, 3);
    assert_eq!(persistence.list_accounts().unwrap().len(), 1);
}
