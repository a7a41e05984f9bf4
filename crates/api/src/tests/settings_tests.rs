// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use studyq_audit::{Actor, AuditAction, AuditEvent, AuditTrail};
use studyq_domain::{Account, DeliveryChannel, Role, SystemSettings};
use studyq_persistence::Persistence;
use time::Duration;
use tokio::sync::Mutex;

use super::helpers::{
    Behavior, FakeEmailSender, FakeWhatsAppSender, NOW, admin_actor, create_seeded_persistence,
    create_test_client, student_actor, teacher_actor,
};
use crate::{
    ApiError, AuthenticatedActor, ChannelCheckRequest, ChannelCheckResponse,
    CreateAccountRequest, CreateAccountResponse, LoginRequest, SecurityPolicies,
    SessionRegistry, check_email_channel, check_whatsapp_channel, create_account, get_settings,
    login, security_policies, update_settings,
};

fn save(
    persistence: &mut Persistence,
    settings: &SystemSettings,
) -> Result<SystemSettings, ApiError> {
    let admin: AuthenticatedActor = admin_actor(persistence);
    update_settings(persistence, settings, &admin, &create_test_client(), NOW)
}

fn sign_in(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    username: &str,
    password: &str,
) -> Result<(), ApiError> {
    let policies: SecurityPolicies = security_policies(persistence).unwrap();
    let request: LoginRequest = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    login(
        persistence,
        sessions,
        &request,
        &policies.lockout,
        &policies.session,
        &create_test_client(),
        NOW,
    )
    .map(|_| ())
}

#[test]
fn test_admin_reads_default_settings() {
    let mut persistence: Persistence = create_seeded_persistence();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);

    let settings: SystemSettings = get_settings(&mut persistence, &admin).unwrap();

    assert_eq!(settings, SystemSettings::default());
}

#[test]
fn test_only_admins_manage_settings() {
    let mut persistence: Persistence = create_seeded_persistence();
    let student: AuthenticatedActor = student_actor(&mut persistence);
    let teacher: AuthenticatedActor = teacher_actor(&mut persistence);
    let changed: SystemSettings = SystemSettings {
        max_login_attempts: 3,
        ..SystemSettings::default()
    };

    assert!(matches!(
        get_settings(&mut persistence, &student),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        update_settings(
            &mut persistence,
            &changed,
            &teacher,
            &create_test_client(),
            NOW
        ),
        Err(ApiError::Unauthorized { .. })
    ));
    assert_eq!(
        persistence.load_settings().unwrap(),
        SystemSettings::default()
    );
}

#[test]
fn test_update_settings_is_stored_and_audited() {
    let mut persistence: Persistence = create_seeded_persistence();
    let changed: SystemSettings = SystemSettings {
        max_login_attempts: 3,
        session_timeout: 60,
        ..SystemSettings::default()
    };

    let saved: SystemSettings = save(&mut persistence, &changed).unwrap();

    assert_eq!(saved, changed);
    assert_eq!(persistence.load_settings().unwrap(), changed);
    let trail: AuditTrail = persistence.audit_trail().unwrap();
    let events: Vec<&AuditEvent> = trail.by_action(AuditAction::SettingsUpdate);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].actor_id(), "admin-001");
    assert_eq!(
        events[0].details(),
        "Updated system settings: maxLoginAttempts, sessionTimeout"
    );
}

#[test]
fn test_out_of_range_settings_are_rejected() {
    let mut persistence: Persistence = create_seeded_persistence();
    let invalid: SystemSettings = SystemSettings {
        lockout_duration: 90,
        ..SystemSettings::default()
    };

    let err: ApiError = save(&mut persistence, &invalid).unwrap_err();

    assert_eq!(
        err,
        ApiError::InvalidInput {
            field: String::from("lockoutDuration"),
            message: String::from("lockoutDuration must be between 5 and 60, got 90"),
        }
    );
    assert_eq!(
        persistence.load_settings().unwrap(),
        SystemSettings::default()
    );
    assert!(
        persistence
            .audit_trail()
            .unwrap()
            .by_action(AuditAction::SettingsUpdate)
            .is_empty()
    );
}

#[test]
fn test_stored_attempt_limit_drives_lockout() {
    let mut persistence: Persistence = create_seeded_persistence();
    let mut sessions: SessionRegistry = SessionRegistry::new();
    save(
        &mut persistence,
        &SystemSettings {
            max_login_attempts: 2,
            lockout_duration: 30,
            ..SystemSettings::default()
        },
    )
    .unwrap();

    for _ in 0..2 {
        assert!(matches!(
            sign_in(&mut persistence, &mut sessions, "jane.smith", "wrong"),
            Err(ApiError::AuthenticationFailed { .. })
        ));
    }

    assert!(matches!(
        sign_in(&mut persistence, &mut sessions, "jane.smith", "student123"),
        Err(ApiError::AccountLocked { .. })
    ));
    let jane: Account = persistence
        .get_account_by_username("jane.smith")
        .unwrap()
        .unwrap();
    assert_eq!(jane.locked_until, Some(NOW + Duration::minutes(30)));
}

#[test]
fn test_temporary_password_meets_stored_minimum_length() {
    let mut persistence: Persistence = create_seeded_persistence();
    save(
        &mut persistence,
        &SystemSettings {
            password_min_length: 18,
            ..SystemSettings::default()
        },
    )
    .unwrap();
    let admin: AuthenticatedActor = admin_actor(&mut persistence);
    let request: CreateAccountRequest = CreateAccountRequest {
        first_name: String::from("Grace"),
        last_name: String::from("Hopper"),
        email: String::from("grace@studyq.edu"),
        role: Role::Teacher,
        academic_year: None,
        current_semester: None,
        whatsapp_number: None,
        send_credentials: false,
    };

    let response: CreateAccountResponse =
        create_account(&mut persistence, &request, &admin, &create_test_client(), NOW).unwrap();

    assert_eq!(response.temporary_password.chars().count(), 18);
}

#[test]
fn test_saving_settings_prunes_expired_audit_events() {
    let mut persistence: Persistence = create_seeded_persistence();
    persistence
        .record_audit_event(AuditEvent::new(
            Actor::new(String::from("admin-001"), String::from("System Administrator")),
            AuditAction::Login,
            String::from("old sign-in"),
            create_test_client(),
            NOW - Duration::days(45),
        ))
        .unwrap();

    save(
        &mut persistence,
        &SystemSettings {
            audit_retention_days: 30,
            ..SystemSettings::default()
        },
    )
    .unwrap();

    let trail: AuditTrail = persistence.audit_trail().unwrap();
    assert!(trail.search("old sign-in").is_empty());
    assert_eq!(trail.by_action(AuditAction::SettingsUpdate).len(), 1);
}

#[tokio::test]
async fn test_email_check_defaults_to_caller_address() {
    let mut seeded: Persistence = create_seeded_persistence();
    let admin: AuthenticatedActor = admin_actor(&mut seeded);
    let persistence: Mutex<Persistence> = Mutex::new(seeded);
    let email: Arc<FakeEmailSender> = FakeEmailSender::new(Behavior::Succeed);

    let response: ChannelCheckResponse = check_email_channel(
        &persistence,
        email.as_ref(),
        &ChannelCheckRequest::default(),
        &admin,
        NOW,
    )
    .await
    .unwrap();

    assert!(response.success);
    assert_eq!(response.channel, DeliveryChannel::Email);
    assert_eq!(response.recipient, "admin@studyplatform.edu");
    let sent = email.sent.lock().unwrap()[0].clone();
    assert_eq!(sent.to, "admin@studyplatform.edu");
    assert_eq!(sent.subject, "StudyQ Email Service Test");
}

#[tokio::test]
async fn test_email_check_reports_provider_failure() {
    let mut seeded: Persistence = create_seeded_persistence();
    let admin: AuthenticatedActor = admin_actor(&mut seeded);
    let persistence: Mutex<Persistence> = Mutex::new(seeded);
    let email: Arc<FakeEmailSender> = FakeEmailSender::new(Behavior::Fail);
    let request: ChannelCheckRequest = ChannelCheckRequest {
        to: Some(String::from("ops@studyq.edu")),
    };

    let response: ChannelCheckResponse =
        check_email_channel(&persistence, email.as_ref(), &request, &admin, NOW)
            .await
            .unwrap();

    assert!(!response.success);
    assert_eq!(response.recipient, "ops@studyq.edu");
    assert_eq!(response.message, "SendGrid API error: 500");
}

#[tokio::test]
async fn test_channel_checks_require_admin() {
    let mut seeded: Persistence = create_seeded_persistence();
    let student: AuthenticatedActor = student_actor(&mut seeded);
    let persistence: Mutex<Persistence> = Mutex::new(seeded);
    let email: Arc<FakeEmailSender> = FakeEmailSender::new(Behavior::Succeed);
    let whatsapp: Arc<FakeWhatsAppSender> = FakeWhatsAppSender::new(Behavior::Succeed);
    let request: ChannelCheckRequest = ChannelCheckRequest {
        to: Some(String::from("+15550001111")),
    };

    assert!(matches!(
        check_email_channel(&persistence, email.as_ref(), &request, &student, NOW).await,
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        check_whatsapp_channel(whatsapp.as_ref(), &request, &student, NOW).await,
        Err(ApiError::Unauthorized { .. })
    ));
    assert_eq!(email.sent_count(), 0);
    assert_eq!(whatsapp.sent_count(), 0);
}

#[tokio::test]
async fn test_whatsapp_check_needs_valid_number() {
    let mut seeded: Persistence = create_seeded_persistence();
    let admin: AuthenticatedActor = admin_actor(&mut seeded);
    let whatsapp: Arc<FakeWhatsAppSender> = FakeWhatsAppSender::new(Behavior::Succeed);

    let missing: ApiError =
        check_whatsapp_channel(whatsapp.as_ref(), &ChannelCheckRequest::default(), &admin, NOW)
            .await
            .unwrap_err();
    assert!(matches!(missing, ApiError::InvalidInput { ref field, .. } if field == "to"));

    let malformed: ChannelCheckRequest = ChannelCheckRequest {
        to: Some(String::from("call me")),
    };
    assert!(matches!(
        check_whatsapp_channel(whatsapp.as_ref(), &malformed, &admin, NOW).await,
        Err(ApiError::InvalidInput { .. })
    ));
    assert_eq!(whatsapp.sent_count(), 0);

    let request: ChannelCheckRequest = ChannelCheckRequest {
        to: Some(String::from("+15550001111")),
    };
    let response: ChannelCheckResponse =
        check_whatsapp_channel(whatsapp.as_ref(), &request, &admin, NOW)
            .await
            .unwrap();
    assert!(response.success);
    assert_eq!(response.channel, DeliveryChannel::WhatsApp);
    assert!(
        whatsapp.sent.lock().unwrap()[0]
            .body
            .starts_with("*StudyQ WhatsApp Test*")
    );
}
