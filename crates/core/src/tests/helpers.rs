// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::collections::BTreeSet;
use studyq_audit::{Actor, AuditAction, AuditEvent, ClientContext};
use studyq_domain::{
    Account, DeliveryChannel, DeliveryLog, DeliveryStatus, Material, Role, StudentProfile,
};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

pub fn create_test_account(id: &str, role: Role, is_active: bool) -> Account {
    let mut account: Account = Account::new(
        id.to_string(),
        format!("user.{id}"),
        format!("{id}@studyq.edu"),
        String::from("Test"),
        id.to_string(),
        role,
        NOW,
    );
    account.is_active = is_active;
    if role == Role::Student {
        account = account.with_student_profile(StudentProfile::new(2024, 3, None));
    }
    account
}

pub fn create_test_material(id: &str, is_active: bool) -> Material {
    Material {
        id: id.to_string(),
        title: format!("Material {id}"),
        description: String::new(),
        subject: String::from("Computer Science"),
        semester: 1,
        academic_year: 2024,
        uploaded_by: String::from("teacher-001"),
        uploaded_by_name: String::from("John Smith"),
        upload_date: NOW,
        file_name: format!("{id}.pdf"),
        file_size: 1024,
        file_type: String::from("application/pdf"),
        tags: BTreeSet::new(),
        is_active,
        download_count: 0,
    }
}

pub fn create_test_delivery_log(id: &str) -> DeliveryLog {
    DeliveryLog {
        id: id.to_string(),
        material_id: String::from("MAT-001"),
        material_title: String::from("Material MAT-001"),
        student_id: String::from("student-001"),
        student_name: String::from("John Doe"),
        channel: DeliveryChannel::Email,
        status: DeliveryStatus::Sent,
        message: String::from("Email sent"),
        timestamp: NOW,
        recipient_email: Some(String::from("john.doe@student.edu")),
        recipient_whatsapp: None,
    }
}

pub fn create_test_event(minutes: i64) -> AuditEvent {
    AuditEvent::new(
        Actor::new(String::from("admin-001"), String::from("System Administrator")),
        AuditAction::Login,
        format!("event {minutes}"),
        ClientContext::default(),
        NOW + Duration::minutes(minutes),
    )
}
