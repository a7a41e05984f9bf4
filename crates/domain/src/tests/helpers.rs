// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeSet;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{Account, Material, Role, StudentProfile};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

pub fn create_test_student(academic_year: u16, current_semester: u8) -> Account {
    Account::new(
        String::from("student-001"),
        String::from("john.doe"),
        String::from("john.doe@student.edu"),
        String::from("John"),
        String::from("Doe"),
        Role::Student,
        NOW,
    )
    .with_student_profile(StudentProfile::new(
        academic_year,
        current_semester,
        Some(String::from("+1234567890")),
    ))
}

pub fn create_test_teacher() -> Account {
    Account::new(
        String::from("teacher-001"),
        String::from("prof.smith"),
        String::from("smith@studyplatform.edu"),
        String::from("John"),
        String::from("Smith"),
        Role::Teacher,
        NOW,
    )
}

pub fn create_test_material(semester: u8, academic_year: u16) -> Material {
    Material {
        id: String::from("MAT-001"),
        title: String::from("Data Structures and Algorithms"),
        description: String::from("Arrays, linked lists, trees and graphs"),
        subject: String::from("Computer Science"),
        semester,
        academic_year,
        uploaded_by: String::from("teacher-001"),
        uploaded_by_name: String::from("John Smith"),
        upload_date: NOW,
        file_name: String::from("dsa.pdf"),
        file_size: 3_145_728,
        file_type: String::from("application/pdf"),
        tags: BTreeSet::from([String::from("algorithms"), String::from("trees")]),
        is_active: true,
        download_count: 0,
    }
}
