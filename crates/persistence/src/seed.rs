// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Demo accounts and materials written into an empty installation.

use std::collections::BTreeSet;
use studyq_domain::{Account, Material, Role, StudentProfile};
use time::OffsetDateTime;

/// Identifier of the seeded teacher, owner of the sample materials.
pub const DEMO_TEACHER_ID: &str = "teacher-001";

/// A demo account and the password it is seeded with.
pub struct DemoAccount {
    pub account: Account,
    pub password: &'static str,
}

fn account(
    id: &str,
    username: &str,
    email: &str,
    (first_name, last_name): (&str, &str),
    role: Role,
    now: OffsetDateTime,
) -> Account {
    Account::new(
        id.to_string(),
        username.to_string(),
        email.to_string(),
        first_name.to_string(),
        last_name.to_string(),
        role,
        now,
    )
}

/// Returns the four demo accounts.
pub fn demo_accounts(now: OffsetDateTime) -> Vec<DemoAccount> {
    vec![
        DemoAccount {
            account: account(
                "admin-001",
                "admin",
                "admin@studyplatform.edu",
                ("System", "Administrator"),
                Role::Admin,
                now,
            ),
            password: "admin123",
        },
        DemoAccount {
            account: account(
                DEMO_TEACHER_ID,
                "prof.smith",
                "smith@studyplatform.edu",
                ("John", "Smith"),
                Role::Teacher,
                now,
            ),
            password: "teacher123",
        },
        DemoAccount {
            account: account(
                "student-001",
                "john.doe",
                "john.doe@student.edu",
                ("John", "Doe"),
                Role::Student,
                now,
            )
            .with_student_profile(StudentProfile::new(
                2024,
                3,
                Some(String::from("+1234567890")),
            )),
            password: "student123",
        },
        DemoAccount {
            account: account(
                "student-002",
                "jane.smith",
                "jane.smith@student.edu",
                ("Jane", "Smith"),
                Role::Student,
                now,
            )
            .with_student_profile(StudentProfile::new(
                2024,
                5,
                Some(String::from("+1234567891")),
            )),
            password: "student123",
        },
    ]
}

struct SampleMaterial {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    file_name: &'static str,
    file_size: u64,
    semester: u8,
    tags: [&'static str; 3],
    download_count: u64,
}

const SAMPLE_MATERIALS: [SampleMaterial; 3] = [
    SampleMaterial {
        id: "MAT-001",
        title: "Introduction to Computer Science",
        description: "Comprehensive guide covering fundamental concepts of computer science",
        file_name: "intro-cs.pdf",
        file_size: 2_048_576,
        semester: 1,
        tags: ["fundamentals", "introduction", "basics"],
        download_count: 45,
    },
    SampleMaterial {
        id: "MAT-002",
        title: "Data Structures and Algorithms",
        description: "Advanced concepts in data structures and algorithm design",
        file_name: "dsa.pdf",
        file_size: 3_145_728,
        semester: 3,
        tags: ["algorithms", "data-structures", "programming"],
        download_count: 32,
    },
    SampleMaterial {
        id: "MAT-003",
        title: "Database Management Systems",
        description: "Complete guide to database design and management",
        file_name: "dbms.pdf",
        file_size: 4_194_304,
        semester: 4,
        tags: ["database", "sql", "design"],
        download_count: 28,
    },
];

/// Returns the three sample materials, all uploaded by the demo teacher.
pub fn demo_materials(now: OffsetDateTime) -> Vec<Material> {
    SAMPLE_MATERIALS
        .iter()
        .map(|sample| Material {
            id: sample.id.to_string(),
            title: sample.title.to_string(),
            description: sample.description.to_string(),
            subject: String::from("Computer Science"),
            semester: sample.semester,
            academic_year: 2024,
            uploaded_by: DEMO_TEACHER_ID.to_string(),
            uploaded_by_name: String::from("John Smith"),
            upload_date: now,
            file_name: sample.file_name.to_string(),
            file_size: sample.file_size,
            file_type: String::from("application/pdf"),
            tags: sample.tags.iter().map(ToString::to_string).collect::<BTreeSet<String>>(),
            is_active: true,
            download_count: sample.download_count,
        })
        .collect()
}
