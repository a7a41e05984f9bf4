// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the StudyQ portal.
//!
//! Authentication and authorization, password policy, the delivery
//! dispatcher and the handler functions the server exposes. Handlers
//! return DTOs from `request_response` and map every failure to
//! `ApiError`.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod csv_export;
mod delivery;
mod error;
mod handlers;
mod password_policy;
mod policies;
mod request_response;
mod session;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, LoginSuccess};
pub use csv_export::AUDIT_CSV_HEADER;
pub use delivery::{DeliveryDispatcher, MISSING_WHATSAPP_NUMBER};
pub use error::{ApiError, AuthError, translate_domain_error};
pub use handlers::{
    apply_audit_retention, authenticate_session, change_password, check_email_channel,
    check_whatsapp_channel, create_account, current_account, delete_account, delete_material,
    deliver_material, export_audit_csv, generate_account_id, generate_material_id,
    get_settings, get_statistics, list_accounts, list_audit_events, list_delivery_logs,
    list_student_materials, list_subjects, list_teacher_materials, login, logout,
    record_download, reset_password, search_materials, security_policies,
    send_login_credentials, send_password_reset, set_account_active, set_material_active,
    update_account, update_material, update_settings, upload_material,
};
pub use password_policy::{
    PASSWORD_SYMBOLS, PasswordPolicy, PasswordStrength, PasswordViolation,
    TEMPORARY_PASSWORD_LENGTH, generate_temporary_password,
};
pub use policies::SecurityPolicies;
pub use request_response::{
    AccountInfo, AccountListQuery, AuditQuery, ChangePasswordRequest, ChannelCheckRequest,
    ChannelCheckResponse, CreateAccountRequest, CreateAccountResponse, CredentialEmailResponse, DeliverRequest, DeliveryLogQuery,
    DeliveryResponse, DownloadResponse, LoginRequest, LoginResponse, MaterialSearchQuery,
    MessageResponse, ResetPasswordResponse, SetActiveRequest, StatisticsResponse,
    UpdateAccountRequest, UpdateMaterialRequest, UploadMaterialRequest,
};
pub use session::{Session, SessionPolicy, SessionRegistry};
