// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions.
//!
//! Synchronous handlers take the persistence adapter directly; the caller
//! holds the lock for the duration of the call. Handlers that send mail or
//! messages take the shared mutex and release it before any send.

use studyq::{
    ChannelReport, DeliveryOutcome, LockoutPolicy, MaterialQuery, RenderedEmail,
    channel_check_email, channel_check_whatsapp, login_credentials_email, materials_by_uploader,
    materials_for_student, password_reset_email, portal_statistics,
    search_materials as search_catalog, subjects,
};
use studyq_audit::{Actor, AuditAction, AuditEvent, AuditTrail, ClientContext};
use studyq_domain::{
    Account, DeliveryChannel, DeliveryLog, Material, Role, StudentProfile, SystemSettings,
    mime_type_for, parse_tags, username_for, validate_account_fields, validate_account_unique,
    validate_email, validate_material_fields, validate_whatsapp_number,
};
use studyq_notify::{EmailMessage, EmailSender, WhatsAppMessage, WhatsAppSender};
use studyq_persistence::Persistence;
use time::{Duration, OffsetDateTime};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, LoginSuccess};
use crate::csv_export::export_audit_csv as render_audit_csv;
use crate::delivery::DeliveryDispatcher;
use crate::error::{ApiError, AuthError, translate_domain_error};
use crate::password_policy::{PasswordPolicy, PasswordStrength, generate_temporary_password};
use crate::policies::SecurityPolicies;
use crate::request_response::{
    AccountInfo, AccountListQuery, AuditQuery, ChangePasswordRequest, ChannelCheckRequest,
    ChannelCheckResponse, CreateAccountRequest, CreateAccountResponse, CredentialEmailResponse,
    DeliverRequest, DeliveryLogQuery,
    DeliveryResponse, DownloadResponse, LoginRequest, LoginResponse, MaterialSearchQuery,
    MessageResponse, ResetPasswordResponse, StatisticsResponse, UpdateAccountRequest,
    UpdateMaterialRequest, UploadMaterialRequest,
};
use crate::session::{Session, SessionPolicy, SessionRegistry};

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MATERIAL_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_ID_ATTEMPTS: usize = 8;

// ============================================================================
// Helpers
// ============================================================================

/// Records an audit event without failing the caller.
///
/// Storage errors are logged and swallowed.
fn record_audit(
    persistence: &mut Persistence,
    actor: Actor,
    action: AuditAction,
    details: String,
    client: &ClientContext,
    now: OffsetDateTime,
) {
    let event: AuditEvent = AuditEvent::new(actor, action, details, client.clone(), now);
    if let Err(e) = persistence.record_audit_event(event) {
        error!(error = %e, action = %action, "Failed to record audit event");
    }
}

fn random_suffix(alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| char::from(alphabet[rand::random_range(0..alphabet.len())]))
        .collect()
}

fn unix_millis(now: OffsetDateTime) -> i128 {
    now.unix_timestamp_nanos() / 1_000_000
}

/// Builds an account id such as `STD-600000-7QX`: role prefix, the last six
/// digits of the creation time in milliseconds, and three random characters.
#[must_use]
pub fn generate_account_id(role: Role, now: OffsetDateTime) -> String {
    format!(
        "{}-{:06}-{}",
        role.id_prefix(),
        unix_millis(now).rem_euclid(1_000_000),
        random_suffix(ID_SUFFIX_ALPHABET, 3)
    )
}

/// Builds a material id such as `MAT-1767225600000-AB12CD`.
#[must_use]
pub fn generate_material_id(now: OffsetDateTime) -> String {
    format!(
        "MAT-{}-{}",
        unix_millis(now),
        random_suffix(MATERIAL_ID_ALPHABET, 6)
    )
}

fn account_not_found(account_id: &str) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Account"),
        message: format!("Account '{account_id}' does not exist"),
    }
}

fn material_not_found(material_id: &str) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Material"),
        message: format!("Material '{material_id}' does not exist"),
    }
}

fn load_account(persistence: &mut Persistence, account_id: &str) -> Result<Account, ApiError> {
    persistence
        .get_account_by_id(account_id)?
        .ok_or_else(|| account_not_found(account_id))
}

fn load_material(persistence: &mut Persistence, material_id: &str) -> Result<Material, ApiError> {
    persistence
        .get_material(material_id)?
        .ok_or_else(|| material_not_found(material_id))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn account_matches(account: &Account, query: &AccountListQuery) -> bool {
    if query.role.is_some_and(|role| account.role != role) {
        return false;
    }
    let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return true;
    };
    let needle: String = term.to_lowercase();
    [
        &account.first_name,
        &account.last_name,
        &account.username,
        &account.email,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

// ============================================================================
// Session
// ============================================================================

/// Signs in and registers a session.
///
/// Both outcomes are audited: `LOGIN` under the account, `LOGIN_FAILED`
/// under the submitted username.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `sessions` - The caller's session registry
/// * `request` - Username and password
/// * `lockout` - Lockout thresholds
/// * `session_policy` - Session lifetime
/// * `client` - Request origin for the audit trail
/// * `now` - The attempt time
///
/// # Errors
///
/// Returns `AuthenticationFailed` for bad credentials or an inactive
/// account, `AccountLocked` while locked, and `Internal` on storage errors.
pub fn login(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    request: &LoginRequest,
    lockout: &LockoutPolicy,
    session_policy: &SessionPolicy,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<LoginResponse, ApiError> {
    match AuthenticationService::authenticate(
        persistence,
        &request.username,
        &request.password,
        lockout,
        session_policy,
        now,
    ) {
        Ok(LoginSuccess { account, session }) => {
            record_audit(
                persistence,
                Actor::new(account.id.clone(), account.display_name()),
                AuditAction::Login,
                String::from("User logged in successfully"),
                client,
                now,
            );
            let response: LoginResponse = LoginResponse {
                token: session.token.clone(),
                expires_at: session.expires_at,
                account: AccountInfo::from(&account),
            };
            sessions.insert(session);
            Ok(response)
        }
        Err(err) => {
            record_audit(
                persistence,
                Actor::anonymous(&request.username),
                AuditAction::LoginFailed,
                format!("Failed login attempt for username: {}", request.username),
                client,
                now,
            );
            Err(err.into())
        }
    }
}

/// Resolves a bearer token to the signed-in actor and account.
///
/// The account must still exist and be active; otherwise the session is
/// revoked.
///
/// # Errors
///
/// Returns `AuthenticationFailed` for unknown, expired or orphaned sessions.
pub fn authenticate_session(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    token: &str,
    now: OffsetDateTime,
) -> Result<(AuthenticatedActor, Account), ApiError> {
    let session: Session = sessions.validate(token, now)?;

    let account: Option<Account> = persistence
        .get_account_by_id(&session.account_id)?
        .filter(|account| account.is_active);
    let Some(account) = account else {
        sessions.revoke(token);
        return Err(AuthError::SessionInvalid.into());
    };

    Ok((AuthenticatedActor::from_account(&account), account))
}

/// Ends a session.
///
/// # Errors
///
/// This handler does not fail once the caller is authenticated; the
/// `Result` keeps the handler signature uniform.
pub fn logout(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    token: &str,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<MessageResponse, ApiError> {
    sessions.revoke(token);
    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::Logout,
        String::from("User logged out"),
        client,
        now,
    );
    info!(account_id = %actor.id, "Signed out");
    Ok(MessageResponse::new("Logged out successfully"))
}

/// Returns the caller's account.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the account has been deleted.
pub fn current_account(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<AccountInfo, ApiError> {
    let account: Account = load_account(persistence, &actor.id)?;
    Ok(AccountInfo::from(&account))
}

/// Changes the caller's own password.
///
/// The current password must match, and the new password must satisfy
/// the policy and its confirmation. All other sessions of the account are
/// revoked; the caller's own session is kept.
///
/// # Errors
///
/// Returns `AuthenticationFailed` for a wrong current password and
/// `PasswordPolicyViolation` listing every violated rule.
#[allow(clippy::too_many_arguments)]
pub fn change_password(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    current_token: &str,
    request: &ChangePasswordRequest,
    actor: &AuthenticatedActor,
    policy: &PasswordPolicy,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<MessageResponse, ApiError> {
    let mut account: Account = load_account(persistence, &actor.id)?;

    if !AuthenticationService::password_matches(&account, &request.current_password) {
        return Err(ApiError::AuthenticationFailed {
            reason: String::from("Current password is incorrect"),
        });
    }

    let strength: PasswordStrength =
        policy.validate_change(&request.new_password, &request.confirm_password);
    if !strength.is_valid {
        return Err(strength.violations.into());
    }

    account.password_hash = Some(persistence.hash_password(&request.new_password)?);
    account.must_change_password = false;
    persistence.save_account(&account)?;

    let revoked: usize = sessions.revoke_for_account(&account.id, Some(current_token));
    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::PasswordChange,
        String::from("Password changed successfully"),
        client,
        now,
    );
    info!(account_id = %account.id, revoked, "Password changed");

    Ok(MessageResponse::new("Password changed successfully"))
}

// ============================================================================
// Accounts
// ============================================================================

/// Creates an account with a generated id, username and temporary password.
///
/// The temporary password is returned once and stored only as a hash;
/// the account must change it at first sign-in.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `InvalidInput` for malformed
/// fields, and `DomainRuleViolation` for a duplicate username or email.
pub fn create_account(
    persistence: &mut Persistence,
    request: &CreateAccountRequest,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<CreateAccountResponse, ApiError> {
    AuthorizationService::authorize_manage_accounts(actor)?;

    let existing: Vec<Account> = persistence.list_accounts()?;
    let mut id: String = generate_account_id(request.role, now);
    for _ in 0..MAX_ID_ATTEMPTS {
        if !existing.iter().any(|a| a.id == id) {
            break;
        }
        id = generate_account_id(request.role, now);
    }

    let mut account: Account = Account::new(
        id,
        username_for(&request.first_name, &request.last_name),
        request.email.trim().to_string(),
        request.first_name.trim().to_string(),
        request.last_name.trim().to_string(),
        request.role,
        now,
    );
    if let (Role::Student, Some(year), Some(semester)) =
        (request.role, request.academic_year, request.current_semester)
    {
        account = account.with_student_profile(StudentProfile::new(
            year,
            semester,
            non_empty(request.whatsapp_number.as_deref()),
        ));
    }

    validate_account_fields(&account).map_err(translate_domain_error)?;
    validate_account_unique(&existing, &account).map_err(translate_domain_error)?;

    let policy: PasswordPolicy = PasswordPolicy::from_settings(&persistence.load_settings()?);
    let temporary_password: String = generate_temporary_password(&policy);
    account.password_hash = Some(persistence.hash_password(&temporary_password)?);
    account.must_change_password = true;
    persistence.save_account(&account)?;

    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::UserCreate,
        format!(
            "Created new {}: {} ({})",
            account.role,
            account.display_name(),
            account.username
        ),
        client,
        now,
    );
    info!(account_id = %account.id, role = account.role.as_str(), "Account created");

    Ok(CreateAccountResponse {
        account: AccountInfo::from(&account),
        temporary_password,
        credentials_email: None,
        message: String::from("Account created successfully"),
    })
}

/// Lists accounts matching the filters.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins.
pub fn list_accounts(
    persistence: &mut Persistence,
    query: &AccountListQuery,
    actor: &AuthenticatedActor,
) -> Result<Vec<AccountInfo>, ApiError> {
    AuthorizationService::authorize_manage_accounts(actor)?;
    Ok(persistence
        .list_accounts()?
        .iter()
        .filter(|account| account_matches(account, query))
        .map(AccountInfo::from)
        .collect())
}

/// Edits an account's names, email and student profile.
///
/// For the student fields, `None` keeps the stored value; an empty
/// WhatsApp number clears it.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `ResourceNotFound` for an
/// unknown id, and validation errors as for `create_account`.
pub fn update_account(
    persistence: &mut Persistence,
    account_id: &str,
    request: &UpdateAccountRequest,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<AccountInfo, ApiError> {
    AuthorizationService::authorize_manage_accounts(actor)?;

    let mut account: Account = load_account(persistence, account_id)?;
    account.first_name = request.first_name.trim().to_string();
    account.last_name = request.last_name.trim().to_string();
    account.email = request.email.trim().to_string();

    if let Some(profile) = account.student.as_mut() {
        if let Some(year) = request.academic_year {
            profile.academic_year = year;
        }
        if let Some(semester) = request.current_semester {
            profile.current_semester = semester;
        }
        if let Some(number) = request.whatsapp_number.as_deref() {
            profile.whatsapp_number = non_empty(Some(number));
        }
    }

    validate_account_fields(&account).map_err(translate_domain_error)?;
    let existing: Vec<Account> = persistence.list_accounts()?;
    validate_account_unique(&existing, &account).map_err(translate_domain_error)?;
    persistence.save_account(&account)?;

    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::UserUpdate,
        format!(
            "Updated user: {} ({})",
            account.display_name(),
            account.username
        ),
        client,
        now,
    );

    Ok(AccountInfo::from(&account))
}

/// Activates or deactivates an account.
///
/// Deactivation revokes the account's sessions. Admins cannot deactivate
/// themselves.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `ResourceNotFound` for an
/// unknown id, and `DomainRuleViolation` for self-deactivation.
pub fn set_account_active(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    account_id: &str,
    is_active: bool,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<AccountInfo, ApiError> {
    AuthorizationService::authorize_manage_accounts(actor)?;
    if !is_active && account_id == actor.id {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("self_deactivation"),
            message: String::from("You cannot deactivate your own account"),
        });
    }

    let mut account: Account = load_account(persistence, account_id)?;
    account.is_active = is_active;
    persistence.save_account(&account)?;
    if !is_active {
        sessions.revoke_for_account(&account.id, None);
    }

    let verb: &str = if is_active { "Activated" } else { "Deactivated" };
    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::UserStatusChange,
        format!("{verb} user: {}", account.display_name()),
        client,
        now,
    );

    Ok(AccountInfo::from(&account))
}

/// Deletes an account permanently.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `DomainRuleViolation` for
/// self-deletion, and `ResourceNotFound` for an unknown id.
pub fn delete_account(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    account_id: &str,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::authorize_manage_accounts(actor)?;
    if account_id == actor.id {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("self_deletion"),
            message: String::from("You cannot delete your own account"),
        });
    }

    let account: Account = load_account(persistence, account_id)?;
    if !persistence.delete_account(account_id)? {
        return Err(account_not_found(account_id));
    }
    sessions.revoke_for_account(account_id, None);

    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::UserDelete,
        format!(
            "Deleted user: {} ({})",
            account.display_name(),
            account.username
        ),
        client,
        now,
    );

    Ok(MessageResponse::new(format!(
        "User {} deleted",
        account.username
    )))
}

/// Replaces an account's password with a new temporary one.
///
/// Clears any lock, requires a password change at next sign-in and
/// revokes the account's sessions.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins and `ResourceNotFound` for an
/// unknown id.
pub fn reset_password(
    persistence: &mut Persistence,
    sessions: &mut SessionRegistry,
    account_id: &str,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<ResetPasswordResponse, ApiError> {
    AuthorizationService::authorize_manage_accounts(actor)?;

    let mut account: Account = load_account(persistence, account_id)?;
    let policy: PasswordPolicy = PasswordPolicy::from_settings(&persistence.load_settings()?);
    let temporary_password: String = generate_temporary_password(&policy);
    account.password_hash = Some(persistence.hash_password(&temporary_password)?);
    account.must_change_password = true;
    LockoutPolicy::clear(&mut account);
    persistence.save_account(&account)?;
    sessions.revoke_for_account(&account.id, None);

    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::PasswordReset,
        format!("Reset password for user: {}", account.display_name()),
        client,
        now,
    );

    Ok(ResetPasswordResponse {
        account: AccountInfo::from(&account),
        temporary_password,
        reset_email: None,
        message: String::from("Password reset successfully"),
    })
}

// ============================================================================
// Credential emails
// ============================================================================

#[derive(Clone, Copy)]
enum CredentialMail {
    Welcome,
    Reset,
}

async fn send_credential_mail(
    persistence: &Mutex<Persistence>,
    sender: &dyn EmailSender,
    kind: CredentialMail,
    account_id: &str,
    temporary_password: &str,
    login_url: &str,
) -> Result<CredentialEmailResponse, ApiError> {
    let mut store: MutexGuard<'_, Persistence> = persistence.lock().await;
    let account: Account = load_account(&mut store, account_id)?;
    drop(store);

    if !AuthenticationService::password_matches(&account, temporary_password) {
        return Err(ApiError::InvalidInput {
            field: String::from("temporary_password"),
            message: String::from("Temporary password does not match the account"),
        });
    }

    let rendered: RenderedEmail = match kind {
        CredentialMail::Welcome => login_credentials_email(&account, temporary_password, login_url),
        CredentialMail::Reset => password_reset_email(&account, temporary_password, login_url),
    };
    let message: EmailMessage = EmailMessage {
        to: account.email.clone(),
        subject: rendered.subject,
        body: rendered.body,
        attachment: None,
    };

    let report: ChannelReport = sender.send_email(&message).await;
    if !report.success {
        warn!(account_id = %account.id, message = %report.message, "Credential email failed");
    }

    Ok(CredentialEmailResponse {
        success: report.success,
        message: report.message,
        delivery_id: report.delivery_id,
    })
}

/// Emails a new account its username and temporary password.
///
/// The password is checked against the stored hash first, so only the
/// password actually issued can be sent.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown account and `InvalidInput`
/// if the password does not match. A failed send is reported in the
/// response, not as an error.
pub async fn send_login_credentials(
    persistence: &Mutex<Persistence>,
    sender: &dyn EmailSender,
    account_id: &str,
    temporary_password: &str,
    login_url: &str,
) -> Result<CredentialEmailResponse, ApiError> {
    send_credential_mail(
        persistence,
        sender,
        CredentialMail::Welcome,
        account_id,
        temporary_password,
        login_url,
    )
    .await
}

/// Emails an account its reset temporary password.
///
/// # Errors
///
/// As for `send_login_credentials`.
pub async fn send_password_reset(
    persistence: &Mutex<Persistence>,
    sender: &dyn EmailSender,
    account_id: &str,
    temporary_password: &str,
    login_url: &str,
) -> Result<CredentialEmailResponse, ApiError> {
    send_credential_mail(
        persistence,
        sender,
        CredentialMail::Reset,
        account_id,
        temporary_password,
        login_url,
    )
    .await
}

// ============================================================================
// Materials
// ============================================================================

/// Registers an uploaded material's metadata.
///
/// # Errors
///
/// Returns `Unauthorized` for students and `InvalidInput` for bad fields,
/// an unsupported file type or an oversized file.
pub fn upload_material(
    persistence: &mut Persistence,
    request: &UploadMaterialRequest,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<Material, ApiError> {
    AuthorizationService::authorize_upload_material(actor)?;

    let material: Material = Material {
        id: generate_material_id(now),
        title: request.title.trim().to_string(),
        description: request.description.trim().to_string(),
        subject: request.subject.trim().to_string(),
        semester: request.semester,
        academic_year: request.academic_year,
        uploaded_by: actor.id.clone(),
        uploaded_by_name: actor.name.clone(),
        upload_date: now,
        file_name: request.file_name.clone(),
        file_size: request.file_size,
        file_type: mime_type_for(&request.file_name).to_string(),
        tags: parse_tags(&request.tags),
        is_active: true,
        download_count: 0,
    };
    validate_material_fields(&material).map_err(translate_domain_error)?;
    persistence.save_material(&material)?;

    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::MaterialUpload,
        format!(
            "Uploaded material: {} for Semester {}",
            material.title, material.semester
        ),
        client,
        now,
    );
    info!(material_id = %material.id, uploaded_by = %actor.id, "Material uploaded");

    Ok(material)
}

/// Edits a material's descriptive fields.
///
/// # Errors
///
/// Returns `ResourceNotFound`, `Unauthorized` unless the caller uploaded
/// the material or is an admin, and `InvalidInput` for bad fields.
pub fn update_material(
    persistence: &mut Persistence,
    material_id: &str,
    request: &UpdateMaterialRequest,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<Material, ApiError> {
    let mut material: Material = load_material(persistence, material_id)?;
    AuthorizationService::authorize_modify_material(actor, &material)?;

    material.title = request.title.trim().to_string();
    material.description = request.description.trim().to_string();
    material.subject = request.subject.trim().to_string();
    material.semester = request.semester;
    material.academic_year = request.academic_year;
    material.tags = parse_tags(&request.tags);
    validate_material_fields(&material).map_err(translate_domain_error)?;
    persistence.save_material(&material)?;

    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::MaterialUpdate,
        format!("Updated material: {}", material.title),
        client,
        now,
    );

    Ok(material)
}

/// Shows or hides a material from students.
///
/// # Errors
///
/// Returns `ResourceNotFound` or `Unauthorized` as for `update_material`.
pub fn set_material_active(
    persistence: &mut Persistence,
    material_id: &str,
    is_active: bool,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<Material, ApiError> {
    let mut material: Material = load_material(persistence, material_id)?;
    AuthorizationService::authorize_modify_material(actor, &material)?;

    material.is_active = is_active;
    persistence.save_material(&material)?;

    let verb: &str = if is_active { "Activated" } else { "Deactivated" };
    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::MaterialUpdate,
        format!("{verb} material: {}", material.title),
        client,
        now,
    );

    Ok(material)
}

/// Deletes a material.
///
/// # Errors
///
/// Returns `ResourceNotFound` or `Unauthorized` as for `update_material`.
pub fn delete_material(
    persistence: &mut Persistence,
    material_id: &str,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<MessageResponse, ApiError> {
    let material: Material = load_material(persistence, material_id)?;
    AuthorizationService::authorize_modify_material(actor, &material)?;

    if !persistence.delete_material(material_id)? {
        return Err(material_not_found(material_id));
    }

    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::MaterialDelete,
        format!("Deleted material: {}", material.title),
        client,
        now,
    );

    Ok(MessageResponse::new(format!(
        "Material {} deleted",
        material.title
    )))
}

/// Lists the materials visible to the calling student.
///
/// # Errors
///
/// Returns `Unauthorized` unless the caller is a student.
pub fn list_student_materials(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<Material>, ApiError> {
    if actor.role != Role::Student {
        return Err(ApiError::Unauthorized {
            action: String::from("list_student_materials"),
            required_role: String::from("Student"),
        });
    }
    let student: Account = load_account(persistence, &actor.id)?;
    let materials: Vec<Material> = persistence.list_materials()?;
    Ok(materials_for_student(&materials, &student)
        .into_iter()
        .cloned()
        .collect())
}

/// Lists the caller's uploads, or every material for an admin.
///
/// # Errors
///
/// Returns `Unauthorized` for students.
pub fn list_teacher_materials(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<Material>, ApiError> {
    AuthorizationService::authorize_upload_material(actor)?;
    let materials: Vec<Material> = persistence.list_materials()?;
    if actor.role == Role::Admin {
        return Ok(materials);
    }
    Ok(materials_by_uploader(&materials, &actor.id)
        .into_iter()
        .cloned()
        .collect())
}

/// Searches active materials. Students search only what they can see.
///
/// # Errors
///
/// Returns an error if the stores cannot be read.
pub fn search_materials(
    persistence: &mut Persistence,
    query: &MaterialSearchQuery,
    actor: &AuthenticatedActor,
) -> Result<Vec<Material>, ApiError> {
    let mut materials: Vec<Material> = persistence.list_materials()?;
    if actor.role == Role::Student {
        let student: Account = load_account(persistence, &actor.id)?;
        materials.retain(|material| material.is_visible_to(&student));
    }

    let catalog_query: MaterialQuery = MaterialQuery {
        term: non_empty(query.term.as_deref()),
        semester: query.semester,
        subject: non_empty(query.subject.as_deref()),
    };
    Ok(search_catalog(&materials, &catalog_query)
        .into_iter()
        .cloned()
        .collect())
}

/// Lists the distinct subjects across all materials.
///
/// # Errors
///
/// Returns an error if the material store cannot be read.
pub fn list_subjects(persistence: &mut Persistence) -> Result<Vec<String>, ApiError> {
    Ok(subjects(&persistence.list_materials()?))
}

/// Counts a confirmed download.
///
/// Students may only count materials visible to them.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown or invisible material.
pub fn record_download(
    persistence: &mut Persistence,
    material_id: &str,
    actor: &AuthenticatedActor,
) -> Result<DownloadResponse, ApiError> {
    let material: Material = load_material(persistence, material_id)?;
    if actor.role == Role::Student {
        let student: Account = load_account(persistence, &actor.id)?;
        if !material.is_visible_to(&student) {
            return Err(material_not_found(material_id));
        }
    }

    let download_count: u64 = persistence.increment_download_count(material_id)?;
    Ok(DownloadResponse {
        material_id: material.id,
        download_count,
    })
}

// ============================================================================
// Delivery
// ============================================================================

/// Delivers a material to a student.
///
/// The receiving student defaults to the caller. A student may only
/// request materials visible to them.
///
/// # Errors
///
/// Returns `Unauthorized` if the caller may not deliver to the target,
/// and `ResourceNotFound` for an unknown material or student. Channel
/// failures are part of the response, not errors.
pub async fn deliver_material(
    persistence: &Mutex<Persistence>,
    dispatcher: &DeliveryDispatcher,
    material_id: &str,
    request: &DeliverRequest,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<DeliveryResponse, ApiError> {
    let student_id: &str = request.student_id.as_deref().unwrap_or(&actor.id);
    AuthorizationService::authorize_deliver(actor, student_id)?;

    if actor.role == Role::Student {
        let mut store: MutexGuard<'_, Persistence> = persistence.lock().await;
        let material: Option<Material> = store.get_material(material_id)?;
        let student: Option<Account> = store.get_account_by_id(student_id)?;
        drop(store);
        let visible: bool = match (&material, &student) {
            (Some(material), Some(student)) => material.is_visible_to(student),
            _ => false,
        };
        if !visible {
            return Err(ApiError::ResourceNotFound {
                resource_type: String::from("Delivery target"),
                message: String::from("Material or student not found"),
            });
        }
    }

    let outcome: DeliveryOutcome = dispatcher
        .deliver(persistence, material_id, student_id, request.channel, now)
        .await?;

    Ok(DeliveryResponse {
        success: outcome.success,
        status: outcome.status(),
        message: outcome.message,
    })
}

// ============================================================================
// Logs and statistics
// ============================================================================

fn filter_audit<'a>(trail: &'a AuditTrail, query: &AuditQuery) -> Vec<&'a AuditEvent> {
    let mut events: Vec<&AuditEvent> = trail.search(query.search.as_deref().unwrap_or_default());
    events.retain(|event| {
        query
            .actor_id
            .as_deref()
            .is_none_or(|actor_id| event.actor_id() == actor_id)
            && query.action.is_none_or(|action| event.action() == action)
            && query.from.is_none_or(|from| event.timestamp() >= from)
            && query.to.is_none_or(|to| event.timestamp() <= to)
    });
    events
}

/// Lists audit events matching the filters, newest first.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins.
pub fn list_audit_events(
    persistence: &mut Persistence,
    query: &AuditQuery,
    actor: &AuthenticatedActor,
) -> Result<Vec<AuditEvent>, ApiError> {
    AuthorizationService::authorize_view_audit(actor)?;
    let trail: AuditTrail = persistence.audit_trail()?;
    Ok(filter_audit(&trail, query).into_iter().cloned().collect())
}

/// Exports audit events matching the filters as CSV.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins.
pub fn export_audit_csv(
    persistence: &mut Persistence,
    query: &AuditQuery,
    actor: &AuthenticatedActor,
) -> Result<String, ApiError> {
    AuthorizationService::authorize_view_audit(actor)?;
    let trail: AuditTrail = persistence.audit_trail()?;
    render_audit_csv(&filter_audit(&trail, query))
}

/// Lists delivery logs, newest first.
///
/// Admins see every entry, optionally for one student; students see
/// only their own.
///
/// # Errors
///
/// Returns `Unauthorized` when a non-admin asks for another student's log.
pub fn list_delivery_logs(
    persistence: &mut Persistence,
    query: &DeliveryLogQuery,
    actor: &AuthenticatedActor,
) -> Result<Vec<DeliveryLog>, ApiError> {
    let target: Option<&str> = match actor.role {
        Role::Admin => query.student_id.as_deref(),
        Role::Student | Role::Teacher => {
            Some(query.student_id.as_deref().unwrap_or(&actor.id))
        }
    };
    AuthorizationService::authorize_view_deliveries(actor, target)?;

    Ok(match target {
        Some(student_id) => persistence.delivery_logs_for_student(student_id)?,
        None => persistence.list_delivery_logs()?,
    })
}

/// Returns dashboard statistics.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins.
pub fn get_statistics(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<StatisticsResponse, ApiError> {
    AuthorizationService::authorize_view_statistics(actor)?;
    let accounts: Vec<Account> = persistence.list_accounts()?;
    let materials: Vec<Material> = persistence.list_materials()?;
    let deliveries: Vec<DeliveryLog> = persistence.list_delivery_logs()?;
    let trail: AuditTrail = persistence.audit_trail()?;
    Ok(portal_statistics(&accounts, &materials, &deliveries, &trail).into())
}

// ============================================================================
// Settings
// ============================================================================

/// Names the settings whose values differ, in wire-name order.
fn changed_settings(before: &SystemSettings, after: &SystemSettings) -> Vec<String> {
    let (Ok(serde_json::Value::Object(before)), Ok(serde_json::Value::Object(after))) =
        (serde_json::to_value(before), serde_json::to_value(after))
    else {
        return Vec::new();
    };
    after
        .iter()
        .filter(|(name, value)| before.get(name.as_str()) != Some(*value))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Returns the policies built from the stored settings.
///
/// # Errors
///
/// Returns an error if the settings cannot be read.
pub fn security_policies(persistence: &mut Persistence) -> Result<SecurityPolicies, ApiError> {
    Ok(SecurityPolicies::from_settings(&persistence.load_settings()?))
}

/// Returns the stored system settings.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins.
pub fn get_settings(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<SystemSettings, ApiError> {
    AuthorizationService::authorize_manage_settings(actor)?;
    Ok(persistence.load_settings()?)
}

/// Replaces the system settings.
///
/// New policies apply from the next sign-in, session or password change;
/// existing sessions and locks keep the values they were issued with.
/// Audit events older than the new retention window are pruned.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins and `InvalidInput` for a value
/// outside its range.
pub fn update_settings(
    persistence: &mut Persistence,
    request: &SystemSettings,
    actor: &AuthenticatedActor,
    client: &ClientContext,
    now: OffsetDateTime,
) -> Result<SystemSettings, ApiError> {
    AuthorizationService::authorize_manage_settings(actor)?;
    request.validate().map_err(translate_domain_error)?;

    let previous: SystemSettings = persistence.load_settings()?;
    persistence.save_settings(request)?;

    let changed: Vec<String> = changed_settings(&previous, request);
    let details: String = if changed.is_empty() {
        String::from("Saved system settings without changes")
    } else {
        format!("Updated system settings: {}", changed.join(", "))
    };
    info!(actor_id = %actor.id, changed = changed.len(), "System settings saved");

    let pruned: usize = apply_audit_retention(persistence, request, now)?;
    if pruned > 0 {
        info!(pruned, "Audit retention applied");
    }
    record_audit(
        persistence,
        actor.to_audit_actor(),
        AuditAction::SettingsUpdate,
        details,
        client,
        now,
    );

    Ok(*request)
}

/// Drops audit events older than the retention window of `settings`.
///
/// # Returns
///
/// How many events were dropped.
///
/// # Errors
///
/// Returns an error if the audit trail cannot be read or written.
pub fn apply_audit_retention(
    persistence: &mut Persistence,
    settings: &SystemSettings,
    now: OffsetDateTime,
) -> Result<usize, ApiError> {
    let cutoff: OffsetDateTime = now - Duration::days(i64::from(settings.audit_retention_days));
    Ok(persistence.prune_audit_events(cutoff)?)
}

/// Sends a check email through the configured email channel.
///
/// Without an explicit recipient the message goes to the caller's own
/// address. A failed send is reported in the response, not as an error.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins and `InvalidInput` for a
/// malformed recipient.
pub async fn check_email_channel(
    persistence: &Mutex<Persistence>,
    sender: &dyn EmailSender,
    request: &ChannelCheckRequest,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<ChannelCheckResponse, ApiError> {
    AuthorizationService::authorize_manage_settings(actor)?;

    let recipient: String = match non_empty(request.to.as_deref()) {
        Some(to) => to,
        None => {
            let mut store: MutexGuard<'_, Persistence> = persistence.lock().await;
            load_account(&mut store, &actor.id)?.email
        }
    };
    validate_email(&recipient).map_err(translate_domain_error)?;

    let rendered: RenderedEmail = channel_check_email(now);
    let message: EmailMessage = EmailMessage {
        to: recipient.clone(),
        subject: rendered.subject,
        body: rendered.body,
        attachment: None,
    };
    let report: ChannelReport = sender.send_email(&message).await;
    info!(success = report.success, "Email channel check sent");

    Ok(ChannelCheckResponse {
        channel: DeliveryChannel::Email,
        recipient,
        success: report.success,
        message: report.message,
        delivery_id: report.delivery_id,
    })
}

/// Sends a check message through the configured WhatsApp channel.
///
/// A failed send is reported in the response, not as an error.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins and `InvalidInput` for a missing
/// or malformed number.
pub async fn check_whatsapp_channel(
    sender: &dyn WhatsAppSender,
    request: &ChannelCheckRequest,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<ChannelCheckResponse, ApiError> {
    AuthorizationService::authorize_manage_settings(actor)?;

    let recipient: String =
        non_empty(request.to.as_deref()).ok_or_else(|| ApiError::InvalidInput {
            field: String::from("to"),
            message: String::from("A WhatsApp number is required"),
        })?;
    validate_whatsapp_number(&recipient).map_err(translate_domain_error)?;

    let message: WhatsAppMessage = WhatsAppMessage {
        to: recipient.clone(),
        body: channel_check_whatsapp(now),
        media_url: None,
    };
    let report: ChannelReport = sender.send_whatsapp(&message).await;
    info!(success = report.success, "WhatsApp channel check sent");

    Ok(ChannelCheckResponse {
        channel: DeliveryChannel::WhatsApp,
        recipient,
        success: report.success,
        message: report.message,
        delivery_id: report.delivery_id,
    })
}
