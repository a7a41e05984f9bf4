// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! These are distinct from domain types and represent the API contract.
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use studyq::PortalStatistics;
use studyq_audit::{AuditAction, AuditEvent};
use studyq_domain::{Account, DeliveryChannel, DeliveryStatus, Role};
use time::OffsetDateTime;

// ============================================================================
// Session
// ============================================================================

/// API request to sign in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The login name.
    pub username: String,
    /// The password.
    pub password: String,
}

/// API response for a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// When the session lapses.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// The signed-in account.
    pub account: AccountInfo,
}

/// API request to change the caller's own password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// The password currently in use.
    pub current_password: String,
    /// The new password.
    pub new_password: String,
    /// The new password, typed again.
    pub confirm_password: String,
}

/// A response carrying only a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// An account as returned by the API. The password hash is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Account identifier.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account role.
    pub role: Role,
    /// Whether sign-in is allowed.
    pub is_active: bool,
    /// Whether the next sign-in must change the password.
    pub must_change_password: bool,
    /// Consecutive failed sign-ins.
    pub failed_login_attempts: u32,
    /// End of the current lock, if any.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub locked_until: Option<OffsetDateTime>,
    /// Last successful sign-in.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Student academic year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<u16>,
    /// Student current semester.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_semester: Option<u8>,
    /// Student WhatsApp number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            role: account.role,
            is_active: account.is_active,
            must_change_password: account.must_change_password,
            failed_login_attempts: account.failed_login_attempts,
            locked_until: account.locked_until,
            last_login: account.last_login,
            created_at: account.created_at,
            academic_year: account.student.as_ref().map(|p| p.academic_year),
            current_semester: account.student.as_ref().map(|p| p.current_semester),
            whatsapp_number: account
                .student
                .as_ref()
                .and_then(|p| p.whatsapp_number.clone()),
        }
    }
}

/// API request to create an account.
///
/// The username is derived from the names and a temporary password is
/// generated; neither is supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Role of the new account.
    pub role: Role,
    /// Required for students.
    #[serde(default)]
    pub academic_year: Option<u16>,
    /// Required for students.
    #[serde(default)]
    pub current_semester: Option<u8>,
    /// Optional for students.
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    /// Email the credentials to the new account after creation.
    #[serde(default)]
    pub send_credentials: bool,
}

/// API response for a successful account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    /// The created account.
    pub account: AccountInfo,
    /// The generated password. Returned only here and never stored in
    /// plain text.
    pub temporary_password: String,
    /// Outcome of the credentials email, when one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_email: Option<CredentialEmailResponse>,
    /// A success message.
    pub message: String,
}

/// API request to edit an account's profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Student academic year.
    #[serde(default)]
    pub academic_year: Option<u16>,
    /// Student current semester.
    #[serde(default)]
    pub current_semester: Option<u8>,
    /// Student WhatsApp number; empty clears it.
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

/// API request to activate or deactivate an account or material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    /// The new state.
    pub is_active: bool,
}

/// Filters for the account list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountListQuery {
    /// Matched against names, username and email, ignoring case.
    #[serde(default)]
    pub search: Option<String>,
    /// Only this role.
    #[serde(default)]
    pub role: Option<Role>,
}

/// API response for an admin password reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    /// The account after the reset.
    pub account: AccountInfo,
    /// The new temporary password, returned once.
    pub temporary_password: String,
    /// Outcome of the reset email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_email: Option<CredentialEmailResponse>,
    /// A success message.
    pub message: String,
}

/// Outcome of a credentials or reset email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEmailResponse {
    /// Whether the email was accepted.
    pub success: bool,
    /// Provider or failure message.
    pub message: String,
    /// Provider delivery id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
}

// ============================================================================
// Materials
// ============================================================================

/// API request to upload material metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMaterialRequest {
    /// Title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Subject.
    pub subject: String,
    /// Target semester.
    pub semester: u8,
    /// Target academic year.
    pub academic_year: u16,
    /// Original file name; its extension decides the file type.
    pub file_name: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
}

/// API request to edit a material's descriptive fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterialRequest {
    /// Title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Subject.
    pub subject: String,
    /// Target semester.
    pub semester: u8,
    /// Target academic year.
    pub academic_year: u16,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
}

/// Filters for a material search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSearchQuery {
    /// Free-text term.
    #[serde(default)]
    pub term: Option<String>,
    /// Only this semester.
    #[serde(default)]
    pub semester: Option<u8>,
    /// Only this subject.
    #[serde(default)]
    pub subject: Option<String>,
}

/// API request to deliver a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverRequest {
    /// Requested channel(s).
    pub channel: DeliveryChannel,
    /// Receiving student; defaults to the caller.
    #[serde(default)]
    pub student_id: Option<String>,
}

/// API response for a delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResponse {
    /// Whether at least one requested channel succeeded.
    pub success: bool,
    /// The aggregated message.
    pub message: String,
    /// The status written to the delivery log.
    pub status: DeliveryStatus,
}

/// API response for a recorded download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    /// The material.
    pub material_id: String,
    /// The counter after the increment.
    pub download_count: u64,
}

// ============================================================================
// Logs
// ============================================================================

/// Filters for the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    /// Only events by this actor.
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Only events of this action.
    #[serde(default)]
    pub action: Option<AuditAction>,
    /// Matched against actor name, action and details, ignoring case.
    #[serde(default)]
    pub search: Option<String>,
    /// Inclusive lower bound.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    /// Inclusive upper bound.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,
}

/// Filters for the delivery log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLogQuery {
    /// Only deliveries to this student.
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Dashboard statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    /// All accounts.
    pub total_users: usize,
    /// Active accounts.
    pub active_users: usize,
    /// Active materials.
    pub total_materials: usize,
    /// Delivery log entries.
    pub total_deliveries: usize,
    /// Newest audit events.
    pub recent_activity: Vec<AuditEvent>,
}

impl From<PortalStatistics> for StatisticsResponse {
    fn from(stats: PortalStatistics) -> Self {
        Self {
            total_users: stats.total_users,
            active_users: stats.active_users,
            total_materials: stats.total_materials,
            total_deliveries: stats.total_deliveries,
            recent_activity: stats.recent_activity,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// API request to send a channel check message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCheckRequest {
    /// Recipient address or number; defaults to the caller's own contact.
    #[serde(default)]
    pub to: Option<String>,
}

/// Outcome of a channel check message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCheckResponse {
    /// The channel checked.
    pub channel: DeliveryChannel,
    /// Where the message went.
    pub recipient: String,
    /// Whether the provider accepted the message.
    pub success: bool,
    /// Provider or failure message.
    pub message: String,
    /// Provider delivery id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
}
