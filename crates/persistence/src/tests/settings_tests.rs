// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use studyq_audit::{Actor, AuditAction, AuditEvent, ClientContext};
use studyq_domain::SystemSettings;
use time::Duration;

use super::{NOW, create_test_persistence};
use crate::{KeyValueStore, MemoryKeyValueStore, Persistence, SETTINGS_KEY};

#[test]
fn test_missing_settings_read_as_defaults() {
    let mut persistence: Persistence = create_test_persistence();
    assert_eq!(
        persistence.load_settings().unwrap(),
        SystemSettings::default()
    );
}

#[test]
fn test_saved_settings_are_read_back() {
    let mut persistence: Persistence = create_test_persistence();
    let settings: SystemSettings = SystemSettings {
        max_login_attempts: 3,
        session_timeout: 60,
        require_special_chars: false,
        ..SystemSettings::default()
    };

    persistence.save_settings(&settings).unwrap();

    assert_eq!(persistence.load_settings().unwrap(), settings);
}

#[test]
fn test_settings_use_their_own_key() {
    let mut store: MemoryKeyValueStore = MemoryKeyValueStore::new();
    store
        .set(SETTINGS_KEY, r#"{"maxLoginAttempts":7,"lockoutDuration":20}"#)
        .unwrap();
    let mut persistence: Persistence = Persistence::with_store(Box::new(store));

    let settings: SystemSettings = persistence.load_settings().unwrap();
    assert_eq!(settings.max_login_attempts, 7);
    assert_eq!(settings.lockout_duration, 20);
    assert_eq!(settings.session_timeout, 120);
}

#[test]
fn test_seed_settings_keeps_existing_document() {
    let mut persistence: Persistence = create_test_persistence();
    let first: SystemSettings = SystemSettings {
        lockout_duration: 30,
        ..SystemSettings::default()
    };
    let second: SystemSettings = SystemSettings {
        lockout_duration: 45,
        ..SystemSettings::default()
    };

    assert!(persistence.seed_settings(&first).unwrap());
    assert!(!persistence.seed_settings(&second).unwrap());
    assert_eq!(persistence.load_settings().unwrap().lockout_duration, 30);
}

#[test]
fn test_prune_audit_events_drops_older_entries() {
    let mut persistence: Persistence = create_test_persistence();
    for days in [100, 40, 1] {
        persistence
            .record_audit_event(AuditEvent::new(
                Actor::new(String::from("admin-001"), String::from("admin")),
                AuditAction::Login,
                format!("{days} days ago"),
                ClientContext::default(),
                NOW - Duration::days(days),
            ))
            .unwrap();
    }

    let dropped: usize = persistence
        .prune_audit_events(NOW - Duration::days(90))
        .unwrap();

    assert_eq!(dropped, 1);
    let details: Vec<String> = persistence
        .audit_trail()
        .unwrap()
        .events()
        .iter()
        .map(|event| event.details().to_string())
        .collect();
    assert_eq!(details, vec!["1 days ago", "40 days ago"]);
}
