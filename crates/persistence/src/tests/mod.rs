// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;
mod material_tests;
mod seed_tests;
mod settings_tests;

use studyq_domain::{Account, Material, Role, StudentProfile};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::Persistence;

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

/// In-memory persistence with the cheapest bcrypt cost.
pub fn create_test_persistence() -> Persistence {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    persistence.set_password_cost(crate::MIN_PASSWORD_COST);
    persistence
}

pub fn create_test_student(id: &str, username: &str) -> Account {
    Account::new(
        id.to_string(),
        username.to_string(),
        format!("{username}@student.edu"),
        String::from("Test"),
        String::from("Student"),
        Role::Student,
        NOW,
    )
    .with_student_profile(StudentProfile::new(2024, 3, None))
}

pub fn create_test_material(id: &str) -> Material {
    Material {
        id: id.to_string(),
        title: format!("Material {id}"),
        description: String::new(),
        subject: String::from("Mathematics"),
        semester: 2,
        academic_year: 2024,
        uploaded_by: String::from("teacher-001"),
        uploaded_by_name: String::from("John Smith"),
        upload_date: NOW,
        file_name: String::from("notes.pdf"),
        file_size: 1024,
        file_type: String::from("application/pdf"),
        tags: std::collections::BTreeSet::new(),
        is_active: true,
        download_count: 0,
    }
}
