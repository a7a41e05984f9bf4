// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::str::FromStr;
use time::macros::datetime;

use crate::{ANONYMOUS_ACTOR_ID, Actor, AuditAction, AuditEvent, ClientContext};

#[test]
fn test_anonymous_actor_carries_submitted_username() {
    let actor: Actor = Actor::anonymous("mallory");

    assert_eq!(actor.id, ANONYMOUS_ACTOR_ID);
    assert_eq!(actor.name, "mallory");
}

#[test]
fn test_audit_event_captures_all_fields() {
    let actor: Actor = Actor::new(String::from("admin-001"), String::from("System Administrator"));
    let client: ClientContext = ClientContext::new(
        Some(String::from("127.0.0.1")),
        Some(String::from("curl/8.0")),
    );

    let event: AuditEvent = AuditEvent::new(
        actor,
        AuditAction::UserCreate,
        String::from("Created student account for Jane Smith"),
        client,
        datetime!(2026-03-01 10:00 UTC),
    );

    assert!(!event.id().is_empty());
    assert_eq!(event.actor_id(), "admin-001");
    assert_eq!(event.actor_name(), "System Administrator");
    assert_eq!(event.action(), AuditAction::UserCreate);
    assert_eq!(event.details(), "Created student account for Jane Smith");
    assert_eq!(event.timestamp(), datetime!(2026-03-01 10:00 UTC));
    assert_eq!(event.ip_address(), Some("127.0.0.1"));
    assert_eq!(event.user_agent(), Some("curl/8.0"));
}

#[test]
fn test_audit_events_get_distinct_ids() {
    let build = || {
        AuditEvent::new(
            Actor::anonymous("x"),
            AuditAction::LoginFailed,
            String::new(),
            ClientContext::default(),
            datetime!(2026-03-01 10:00 UTC),
        )
    };
    assert_ne!(build().id(), build().id());
}

#[test]
fn test_audit_action_tags_round_trip() {
    let json: String = serde_json::to_string(&AuditAction::LoginFailed).unwrap();
    assert_eq!(json, "\"LOGIN_FAILED\"");
    assert_eq!(
        AuditAction::from_str("user_status_change").unwrap(),
        AuditAction::UserStatusChange
    );
    assert_eq!(
        AuditAction::from_str("SETTINGS_UPDATE").unwrap(),
        AuditAction::SettingsUpdate
    );
    assert!(AuditAction::from_str("MATERIAL_RENAME").is_err());
}

#[test]
fn test_audit_event_serializes_camel_case() {
    let event: AuditEvent = AuditEvent::new(
        Actor::new(String::from("u1"), String::from("User One")),
        AuditAction::Login,
        String::from("User logged in successfully"),
        ClientContext::default(),
        datetime!(2026-03-01 10:00 UTC),
    );

    let json: String = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"actorId\":\"u1\""));
    assert!(json.contains("\"action\":\"LOGIN\""));
    assert!(!json.contains("ipAddress"));

    let restored: AuditEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, event);
}
