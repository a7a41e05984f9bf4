// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::{AUDIT_LOG_CAPACITY, Actor, AuditAction, AuditEvent, AuditTrail, ClientContext};

const BASE: OffsetDateTime = datetime!(2026-01-01 00:00 UTC);

fn event_at(minutes: i64, actor_id: &str, action: AuditAction, details: &str) -> AuditEvent {
    AuditEvent::new(
        Actor::new(actor_id.to_string(), format!("Name of {actor_id}")),
        action,
        details.to_string(),
        ClientContext::default(),
        BASE + Duration::minutes(minutes),
    )
}

#[test]
fn test_record_inserts_newest_first() {
    let mut trail: AuditTrail = AuditTrail::new();
    trail.record(event_at(0, "a", AuditAction::Login, "first"));
    trail.record(event_at(1, "a", AuditAction::Logout, "second"));

    let details: Vec<&str> = trail.events().iter().map(AuditEvent::details).collect();
    assert_eq!(details, vec!["second", "first"]);
}

#[test]
fn test_trail_never_exceeds_capacity_and_keeps_most_recent() {
    let mut trail: AuditTrail = AuditTrail::new();
    for i in 0..=AUDIT_LOG_CAPACITY {
        let minutes: i64 = i64::try_from(i).unwrap();
        trail.record(event_at(minutes, "a", AuditAction::Login, &i.to_string()));
    }

    assert_eq!(trail.len(), AUDIT_LOG_CAPACITY);
    assert_eq!(trail.events()[0].details(), AUDIT_LOG_CAPACITY.to_string());
    // Event 0 was the oldest and has been evicted.
    assert_eq!(trail.events()[AUDIT_LOG_CAPACITY - 1].details(), "1");
    assert!(trail.events().iter().all(|e| e.details() != "0"));
}

#[test]
fn test_from_events_truncates_oversized_input() {
    let events: Vec<AuditEvent> = (0..AUDIT_LOG_CAPACITY + 5)
        .map(|i| event_at(0, "a", AuditAction::Login, &i.to_string()))
        .collect();
    let trail: AuditTrail = AuditTrail::from_events(events);
    assert_eq!(trail.len(), AUDIT_LOG_CAPACITY);
    assert_eq!(trail.events()[0].details(), "0");
}

#[test]
fn test_by_actor_filters_events() {
    let mut trail: AuditTrail = AuditTrail::new();
    trail.record(event_at(0, "a", AuditAction::Login, "a1"));
    trail.record(event_at(1, "b", AuditAction::Login, "b1"));
    trail.record(event_at(2, "a", AuditAction::Logout, "a2"));

    let details: Vec<&str> = trail.by_actor("a").into_iter().map(AuditEvent::details).collect();
    assert_eq!(details, vec!["a2", "a1"]);
    assert!(trail.by_actor("missing").is_empty());
}

#[test]
fn test_in_range_is_inclusive_on_both_bounds() {
    let mut trail: AuditTrail = AuditTrail::new();
    for minutes in 0..5 {
        trail.record(event_at(minutes, "a", AuditAction::Login, &minutes.to_string()));
    }

    let hits: Vec<&str> = trail
        .in_range(BASE + Duration::minutes(1), BASE + Duration::minutes(3))
        .into_iter()
        .map(AuditEvent::details)
        .collect();
    assert_eq!(hits, vec!["3", "2", "1"]);
}

#[test]
fn test_by_action_and_search() {
    let mut trail: AuditTrail = AuditTrail::new();
    trail.record(event_at(0, "a", AuditAction::LoginFailed, "Failed login attempt"));
    trail.record(event_at(1, "b", AuditAction::MaterialUpload, "Uploaded Algorithms"));

    assert_eq!(trail.by_action(AuditAction::LoginFailed).len(), 1);
    assert_eq!(trail.search("algorithms").len(), 1);
    assert_eq!(trail.search("material_upload").len(), 1);
    assert_eq!(trail.search("name of a").len(), 1);
    assert_eq!(trail.search("").len(), 2);
}

#[test]
fn test_recent_returns_prefix() {
    let mut trail: AuditTrail = AuditTrail::new();
    assert!(trail.recent(5).is_empty());
    for minutes in 0..7 {
        trail.record(event_at(minutes, "a", AuditAction::Login, &minutes.to_string()));
    }
    let recent: Vec<&str> = trail.recent(5).iter().map(AuditEvent::details).collect();
    assert_eq!(recent, vec!["6", "5", "4", "3", "2"]);
}

#[test]
fn test_retain_since_drops_only_older_events() {
    let mut trail: AuditTrail = AuditTrail::new();
    for minutes in 0..5 {
        trail.record(event_at(minutes, "a", AuditAction::Login, &minutes.to_string()));
    }

    let dropped: usize = trail.retain_since(BASE + Duration::minutes(2));

    assert_eq!(dropped, 2);
    let details: Vec<&str> = trail.events().iter().map(AuditEvent::details).collect();
    assert_eq!(details, vec!["4", "3", "2"]);
    assert_eq!(trail.retain_since(BASE), 0);
}
