// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use studyq_audit::{Actor, AuditAction, AuditEvent, ClientContext};
use studyq_domain::{DeliveryChannel, DeliveryLog, DeliveryStatus};
use studyq_persistence::Persistence;
use time::{Duration, OffsetDateTime};

use super::helpers::{
    NOW, admin_actor, create_seeded_persistence, create_test_client, student_actor,
    teacher_actor,
};
use crate::{
    ApiError, AuditQuery, AuthenticatedActor, DeliveryLogQuery, StatisticsResponse,
    export_audit_csv, get_statistics, list_audit_events, list_delivery_logs,
};

fn record(
    persistence: &mut Persistence,
    actor: (&str, &str),
    action: AuditAction,
    details: &str,
    at: OffsetDateTime,
) {
    let event: AuditEvent = AuditEvent::new(
        Actor::new(actor.0.to_string(), actor.1.to_string()),
        action,
        details.to_string(),
        create_test_client(),
        at,
    );
    persistence.record_audit_event(event).unwrap();
}

/// Seeded store with three audit events an hour apart.
fn persistence_with_events() -> Persistence {
    let mut persistence: Persistence = create_seeded_persistence();
    record(
        &mut persistence,
        ("admin-001", "System Administrator"),
        AuditAction::Login,
        "User logged in successfully",
        NOW,
    );
    record(
        &mut persistence,
        ("teacher-001", "John Smith"),
        AuditAction::MaterialUpload,
        "Uploaded material: Graph Theory, Part 2 for Semester 3",
        NOW + Duration::hours(1),
    );
    record(
        &mut persistence,
        ("student-001", "John Doe"),
        AuditAction::Login,
        "User logged in successfully",
        NOW + Duration::hours(2),
    );
    persistence
}

fn delivery_log(id: &str, student_id: &str) -> DeliveryLog {
    DeliveryLog {
        id: id.to_string(),
        material_id: String::from("MAT-001"),
        material_title: String::from("Introduction to Computer Science"),
        student_id: student_id.to_string(),
        student_name: String::from("Student"),
        channel: DeliveryChannel::Email,
        status: DeliveryStatus::Sent,
        message: String::from("Email sent"),
        timestamp: NOW,
        recipient_email: Some(String::from("student@student.edu")),
        recipient_whatsapp: None,
    }
}

fn detail_list(events: &[AuditEvent]) -> Vec<(&str, AuditAction)> {
    events.iter().map(|e| (e.actor_id(), e.action())).collect()
}

#[test]
fn test_audit_listing_is_newest_first() {
    let mut persistence: Persistence = persistence_with_events();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);

    let events: Vec<AuditEvent> =
        list_audit_events(&mut persistence, &AuditQuery::default(), &admin).unwrap();

    assert_eq!(
        detail_list(&events),
        vec![
            ("student-001", AuditAction::Login),
            ("teacher-001", AuditAction::MaterialUpload),
            ("admin-001", AuditAction::Login),
        ]
    );
}

#[test]
fn test_audit_filters_combine() {
    let mut persistence: Persistence = persistence_with_events();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);

    let logins: Vec<AuditEvent> = list_audit_events(
        &mut persistence,
        &AuditQuery {
            action: Some(AuditAction::Login),
            ..AuditQuery::default()
        },
        &admin,
    )
    .unwrap();
    assert_eq!(logins.len(), 2);

    let johns_logins: Vec<AuditEvent> = list_audit_events(
        &mut persistence,
        &AuditQuery {
            action: Some(AuditAction::Login),
            search: Some(String::from("john")),
            ..AuditQuery::default()
        },
        &admin,
    )
    .unwrap();
    assert_eq!(
        detail_list(&johns_logins),
        vec![("student-001", AuditAction::Login)]
    );

    let first_hour: Vec<AuditEvent> = list_audit_events(
        &mut persistence,
        &AuditQuery {
            from: Some(NOW),
            to: Some(NOW + Duration::hours(1)),
            ..AuditQuery::default()
        },
        &admin,
    )
    .unwrap();
    assert_eq!(first_hour.len(), 2);

    let by_actor: Vec<AuditEvent> = list_audit_events(
        &mut persistence,
        &AuditQuery {
            actor_id: Some(String::from("teacher-001")),
            ..AuditQuery::default()
        },
        &admin,
    )
    .unwrap();
    assert_eq!(
        detail_list(&by_actor),
        vec![("teacher-001", AuditAction::MaterialUpload)]
    );
}

#[test]
fn test_audit_search_matches_action_tag() {
    let mut persistence: Persistence = persistence_with_events();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);

    let uploads: Vec<AuditEvent> = list_audit_events(
        &mut persistence,
        &AuditQuery {
            search: Some(String::from("material_upload")),
            ..AuditQuery::default()
        },
        &admin,
    )
    .unwrap();

    assert_eq!(uploads.len(), 1);
}

#[test]
fn test_audit_requires_admin() {
    let mut persistence: Persistence = persistence_with_events();
    let teacher: AuthenticatedActor = teacher_actor(&mut persistence);

    assert!(matches!(
        list_audit_events(&mut persistence, &AuditQuery::default(), &teacher),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        export_audit_csv(&mut persistence, &AuditQuery::default(), &teacher),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_csv_export_quotes_and_orders_rows() {
    let mut persistence: Persistence = persistence_with_events();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);

    let csv: String = export_audit_csv(
        &mut persistence,
        &AuditQuery {
            actor_id: Some(String::from("teacher-001")),
            ..AuditQuery::default()
        },
        &admin,
    )
    .unwrap();

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Timestamp,User,Action,Details,IP Address,User Agent");
    assert_eq!(
        lines[1],
        "2026-03-01T10:00:00Z,John Smith,MATERIAL_UPLOAD,\"Uploaded material: Graph Theory, Part 2 for Semester 3\",127.0.0.1,studyq-tests"
    );
}

#[test]
fn test_csv_export_blank_client_fields() {
    let mut persistence: Persistence = create_seeded_persistence();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);
    persistence
        .record_audit_event(AuditEvent::new(
            Actor::anonymous("ghost"),
            AuditAction::LoginFailed,
            String::from("Failed login attempt for username: ghost"),
            ClientContext::default(),
            NOW,
        ))
        .unwrap();

    let csv: String = export_audit_csv(&mut persistence, &AuditQuery::default(), &admin).unwrap();

    assert!(csv.ends_with(
        "ghost,LOGIN_FAILED,Failed login attempt for username: ghost,,\n"
    ));
}

#[test]
fn test_delivery_log_visibility() {
    let mut persistence: Persistence = create_seeded_persistence();
    persistence
        .append_delivery_log(delivery_log("DL-1", "student-001"))
        .unwrap();
    persistence
        .append_delivery_log(delivery_log("DL-2", "student-002"))
        .unwrap();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);
    let student: AuthenticatedActor = student_actor(&mut persistence);
    let teacher: AuthenticatedActor = teacher_actor(&mut persistence);

    let all: Vec<DeliveryLog> =
        list_delivery_logs(&mut persistence, &DeliveryLogQuery::default(), &admin).unwrap();
    assert_eq!(
        all.iter().map(|log| log.id.as_str()).collect::<Vec<&str>>(),
        vec!["DL-2", "DL-1"]
    );

    let for_jane: Vec<DeliveryLog> = list_delivery_logs(
        &mut persistence,
        &DeliveryLogQuery {
            student_id: Some(String::from("student-002")),
        },
        &admin,
    )
    .unwrap();
    assert_eq!(for_jane.len(), 1);

    let own: Vec<DeliveryLog> =
        list_delivery_logs(&mut persistence, &DeliveryLogQuery::default(), &student).unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, "DL-1");

    let snooping: ApiError = list_delivery_logs(
        &mut persistence,
        &DeliveryLogQuery {
            student_id: Some(String::from("student-002")),
        },
        &student,
    )
    .unwrap_err();
    assert!(matches!(snooping, ApiError::Unauthorized { .. }));

    assert!(
        list_delivery_logs(&mut persistence, &DeliveryLogQuery::default(), &teacher).is_err()
    );
}

#[test]
fn test_statistics() {
    let mut persistence: Persistence = persistence_with_events();
    persistence
        .append_delivery_log(delivery_log("DL-1", "student-001"))
        .unwrap();
    let mut jane = persistence.get_account_by_id("student-002").unwrap().unwrap();
    jane.is_active = false;
    persistence.save_account(&jane).unwrap();
    let mut hidden = persistence.get_material("MAT-003").unwrap().unwrap();
    hidden.is_active = false;
    persistence.save_material(&hidden).unwrap();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);

    let stats: StatisticsResponse = get_statistics(&mut persistence, &admin).unwrap();

    assert_eq!(stats.total_users, 4);
    assert_eq!(stats.active_users, 3);
    assert_eq!(stats.total_materials, 2);
    assert_eq!(stats.total_deliveries, 1);
    assert_eq!(stats.recent_activity.len(), 3);
    assert_eq!(stats.recent_activity[0].actor_id(), "student-001");

    let student: AuthenticatedActor = student_actor(&mut persistence);
    assert!(matches!(
        get_statistics(&mut persistence, &student),
        Err(ApiError::Unauthorized { .. })
    ));
}
