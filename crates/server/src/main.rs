// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod edge;
mod session;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use studyq_api::{
    AccountInfo, AccountListQuery, ApiError, AuditQuery, ChangePasswordRequest,
    ChannelCheckRequest, ChannelCheckResponse, CreateAccountRequest, CreateAccountResponse,
    DeliverRequest, DeliveryDispatcher, DeliveryLogQuery, DeliveryResponse, DownloadResponse,
    LoginRequest, LoginResponse, MaterialSearchQuery, MessageResponse, ResetPasswordResponse,
    SecurityPolicies, SessionRegistry, SetActiveRequest, StatisticsResponse,
    UpdateAccountRequest, UpdateMaterialRequest, UploadMaterialRequest, apply_audit_retention,
    change_password, check_email_channel, check_whatsapp_channel, create_account,
    current_account, delete_account, delete_material, deliver_material, export_audit_csv,
    get_settings, get_statistics, list_accounts, list_audit_events, list_delivery_logs,
    list_student_materials, list_subjects, list_teacher_materials, login, logout,
    record_download, reset_password, search_materials, security_policies,
    send_login_credentials, send_password_reset, set_account_active, set_material_active,
    update_account, update_material, update_settings, upload_material,
};
use studyq_audit::AuditEvent;
use studyq_domain::{DeliveryLog, Material, Role, SystemSettings};
use studyq_notify::{
    EdgeFunctionClient, EmailSender, SendGridClient, SendGridConfig, TracingSender,
    TwilioClient, TwilioConfig, WhatsAppSender, build_http_client,
};
use studyq_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::edge::EdgeProviders;
use crate::session::{RequestClient, SessionAccount};

/// How often expired sessions are swept from the registry.
const SESSION_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(300);

/// How often the audit retention window is applied.
const AUDIT_RETENTION_INTERVAL: StdDuration = StdDuration::from_secs(3600);

/// Timeout applied to every provider call.
const PROVIDER_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Where material deliveries and credential emails go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DeliveryMode {
    /// Log messages instead of sending them.
    Log,
    /// Call SendGrid and Twilio directly.
    Direct,
    /// Call the hosted `send-email` / `send-whatsapp` functions.
    Edge,
}

/// StudyQ Server - HTTP server for the StudyQ material portal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses an in-memory store.
    #[arg(short, long, env = "STUDYQ_DATABASE")]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, env = "STUDYQ_PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(long, env = "STUDYQ_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Public origin of the portal, used in download and login links
    #[arg(long, env = "STUDYQ_PUBLIC_URL", default_value = "http://localhost:3000")]
    public_url: String,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, env = "STUDYQ_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Do not write demo accounts and materials into an empty store
    #[arg(long)]
    no_seed: bool,

    /// Delivery backend
    #[arg(long, env = "STUDYQ_DELIVERY_MODE", value_enum, default_value_t = DeliveryMode::Log)]
    delivery_mode: DeliveryMode,

    /// SendGrid API key
    #[arg(long, env = "SENDGRID_API_KEY", hide_env_values = true)]
    sendgrid_api_key: Option<String>,

    /// Sender address for outbound email
    #[arg(long, env = "FROM_EMAIL")]
    from_email: Option<String>,

    /// Twilio account SID
    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    twilio_account_sid: Option<String>,

    /// Twilio auth token
    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    twilio_auth_token: Option<String>,

    /// Twilio WhatsApp sender number
    #[arg(long, env = "TWILIO_WHATSAPP_NUMBER")]
    twilio_whatsapp_number: Option<String>,

    /// Base URL of the hosted delivery functions (edge mode)
    #[arg(long, env = "EDGE_FUNCTIONS_URL")]
    edge_functions_url: Option<String>,

    /// Bearer key for the hosted delivery functions (edge mode)
    #[arg(long, env = "EDGE_FUNCTIONS_KEY", hide_env_values = true)]
    edge_functions_key: Option<String>,

    /// Initial consecutive failed sign-ins before an account is locked,
    /// used when no settings are stored yet
    #[arg(long, env = "STUDYQ_MAX_FAILED_ATTEMPTS", default_value_t = 5)]
    max_failed_attempts: u32,

    /// Initial lock duration in minutes, used when no settings are stored yet
    #[arg(long, env = "STUDYQ_LOCK_MINUTES", default_value_t = 15)]
    lock_minutes: u32,

    /// Initial session lifetime in minutes, used when no settings are stored yet
    #[arg(long, env = "STUDYQ_SESSION_MINUTES", default_value_t = 120)]
    session_minutes: u32,
}

impl Args {
    /// The settings written into a store that has none.
    fn initial_settings(&self) -> SystemSettings {
        SystemSettings {
            max_login_attempts: self.max_failed_attempts,
            lockout_duration: self.lock_minutes,
            session_timeout: self.session_minutes,
            ..SystemSettings::default()
        }
    }
}

/// Application state shared across handlers.
///
/// The store and the session registry sit behind async mutexes. When both
/// are needed, the store is locked first.
#[derive(Clone)]
struct AppState {
    /// The persistence layer for accounts, materials and logs.
    persistence: Arc<Mutex<Persistence>>,
    /// Live sessions.
    sessions: Arc<Mutex<SessionRegistry>>,
    /// Material delivery and credential mail.
    dispatcher: DeliveryDispatcher,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    /// Always `ok` while the server answers.
    status: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator.
    pub error: bool,
    /// Error message.
    pub message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::AccountLocked { .. } => StatusCode::LOCKED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidInput { .. } | ApiError::PasswordPolicyViolation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

// ============================================================================
// Session
// ============================================================================

/// Handler for POST `/auth/login` endpoint.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    RequestClient(client): RequestClient,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(username = %req.username, "Handling login request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let policies: SecurityPolicies = security_policies(&mut persistence)?;
    let mut sessions: MutexGuard<'_, SessionRegistry> = app_state.sessions.lock().await;
    let response: LoginResponse = login(
        &mut persistence,
        &mut sessions,
        &req,
        &policies.lockout,
        &policies.session,
        &client,
        now(),
    )?;

    Ok(Json(response))
}

/// Handler for POST `/auth/logout` endpoint.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let mut sessions: MutexGuard<'_, SessionRegistry> = app_state.sessions.lock().await;
    let response: MessageResponse = logout(
        &mut persistence,
        &mut sessions,
        &session.token,
        &session.actor,
        &client,
        now(),
    )?;

    Ok(Json(response))
}

/// Handler for GET `/auth/me` endpoint.
async fn handle_current_account(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
) -> Result<Json<AccountInfo>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(current_account(&mut persistence, &session.actor)?))
}

/// Handler for POST `/auth/password` endpoint.
///
/// Changes the caller's own password.
async fn handle_change_password(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let policies: SecurityPolicies = security_policies(&mut persistence)?;
    let mut sessions: MutexGuard<'_, SessionRegistry> = app_state.sessions.lock().await;
    let response: MessageResponse = change_password(
        &mut persistence,
        &mut sessions,
        &session.token,
        &req,
        &session.actor,
        &policies.password,
        &client,
        now(),
    )?;

    Ok(Json(response))
}

// ============================================================================
// Accounts
// ============================================================================

/// Handler for GET `/accounts` endpoint.
async fn handle_list_accounts(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Query(query): Query<AccountListQuery>,
) -> Result<Json<Vec<AccountInfo>>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(list_accounts(&mut persistence, &query, &session.actor)?))
}

/// Handler for POST `/accounts` endpoint.
///
/// Creates an account and, when asked and email notifications are on,
/// emails its credentials.
async fn handle_create_account(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<CreateAccountResponse>, HttpError> {
    info!(
        actor_id = %session.actor.id,
        role = %req.role,
        "Handling create_account request"
    );

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let mut response: CreateAccountResponse =
        create_account(&mut persistence, &req, &session.actor, &client, now())?;
    let settings: SystemSettings = persistence.load_settings().map_err(ApiError::from)?;
    drop(persistence);

    if req.send_credentials && settings.email_notifications {
        response.credentials_email = Some(
            send_login_credentials(
                &app_state.persistence,
                app_state.dispatcher.email_sender(),
                &response.account.id,
                &response.temporary_password,
                app_state.dispatcher.public_url(),
            )
            .await?,
        );
    }

    Ok(Json(response))
}

/// Handler for PUT `/accounts/{id}` endpoint.
async fn handle_update_account(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Path(account_id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<AccountInfo>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let account: AccountInfo = update_account(
        &mut persistence,
        &account_id,
        &req,
        &session.actor,
        &client,
        now(),
    )?;

    Ok(Json(account))
}

/// Handler for DELETE `/accounts/{id}` endpoint.
async fn handle_delete_account(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Path(account_id): Path<String>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let mut sessions: MutexGuard<'_, SessionRegistry> = app_state.sessions.lock().await;
    let response: MessageResponse = delete_account(
        &mut persistence,
        &mut sessions,
        &account_id,
        &session.actor,
        &client,
        now(),
    )?;

    Ok(Json(response))
}

/// Handler for POST `/accounts/{id}/status` endpoint.
async fn handle_set_account_active(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Path(account_id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<AccountInfo>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let mut sessions: MutexGuard<'_, SessionRegistry> = app_state.sessions.lock().await;
    let account: AccountInfo = set_account_active(
        &mut persistence,
        &mut sessions,
        &account_id,
        req.is_active,
        &session.actor,
        &client,
        now(),
    )?;

    Ok(Json(account))
}

/// Handler for POST `/accounts/{id}/reset_password` endpoint.
///
/// Issues a new temporary password and, when email notifications are on,
/// emails it to the account.
async fn handle_reset_password(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Path(account_id): Path<String>,
) -> Result<Json<ResetPasswordResponse>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let mut sessions: MutexGuard<'_, SessionRegistry> = app_state.sessions.lock().await;
    let mut response: ResetPasswordResponse = reset_password(
        &mut persistence,
        &mut sessions,
        &account_id,
        &session.actor,
        &client,
        now(),
    )?;
    drop(sessions);
    let settings: SystemSettings = persistence.load_settings().map_err(ApiError::from)?;
    drop(persistence);

    if settings.email_notifications {
        response.reset_email = Some(
            send_password_reset(
                &app_state.persistence,
                app_state.dispatcher.email_sender(),
                &response.account.id,
                &response.temporary_password,
                app_state.dispatcher.public_url(),
            )
            .await?,
        );
    }

    Ok(Json(response))
}

// ============================================================================
// Materials
// ============================================================================

/// Handler for GET `/materials` endpoint.
///
/// Students get the materials visible to them; teachers their uploads;
/// admins everything.
async fn handle_list_materials(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
) -> Result<Json<Vec<Material>>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let materials: Vec<Material> = match session.actor.role {
        Role::Student => list_student_materials(&mut persistence, &session.actor)?,
        Role::Teacher | Role::Admin => list_teacher_materials(&mut persistence, &session.actor)?,
    };

    Ok(Json(materials))
}

/// Handler for POST `/materials` endpoint.
async fn handle_upload_material(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Json(req): Json<UploadMaterialRequest>,
) -> Result<Json<Material>, HttpError> {
    info!(
        actor_id = %session.actor.id,
        title = %req.title,
        semester = req.semester,
        "Handling upload_material request"
    );

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let material: Material =
        upload_material(&mut persistence, &req, &session.actor, &client, now())?;

    Ok(Json(material))
}

/// Handler for GET `/materials/search` endpoint.
async fn handle_search_materials(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Query(query): Query<MaterialSearchQuery>,
) -> Result<Json<Vec<Material>>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(search_materials(
        &mut persistence,
        &query,
        &session.actor,
    )?))
}

/// Handler for GET `/materials/subjects` endpoint.
async fn handle_list_subjects(
    AxumState(app_state): AxumState<AppState>,
    _session: SessionAccount,
) -> Result<Json<Vec<String>>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(list_subjects(&mut persistence)?))
}

/// Handler for PUT `/materials/{id}` endpoint.
async fn handle_update_material(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Path(material_id): Path<String>,
    Json(req): Json<UpdateMaterialRequest>,
) -> Result<Json<Material>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let material: Material = update_material(
        &mut persistence,
        &material_id,
        &req,
        &session.actor,
        &client,
        now(),
    )?;

    Ok(Json(material))
}

/// Handler for POST `/materials/{id}/status` endpoint.
async fn handle_set_material_active(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Path(material_id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<Material>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let material: Material = set_material_active(
        &mut persistence,
        &material_id,
        req.is_active,
        &session.actor,
        &client,
        now(),
    )?;

    Ok(Json(material))
}

/// Handler for DELETE `/materials/{id}` endpoint.
async fn handle_delete_material(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Path(material_id): Path<String>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let response: MessageResponse = delete_material(
        &mut persistence,
        &material_id,
        &session.actor,
        &client,
        now(),
    )?;

    Ok(Json(response))
}

/// Handler for POST `/materials/{id}/deliver` endpoint.
///
/// The store lock is not held while the channels send.
async fn handle_deliver_material(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Path(material_id): Path<String>,
    Json(req): Json<DeliverRequest>,
) -> Result<Json<DeliveryResponse>, HttpError> {
    info!(
        actor_id = %session.actor.id,
        material_id = %material_id,
        channel = req.channel.as_str(),
        "Handling deliver_material request"
    );

    let response: DeliveryResponse = deliver_material(
        &app_state.persistence,
        &app_state.dispatcher,
        &material_id,
        &req,
        &session.actor,
        now(),
    )
    .await?;

    Ok(Json(response))
}

/// Handler for POST `/materials/{id}/download` endpoint.
async fn handle_record_download(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Path(material_id): Path<String>,
) -> Result<Json<DownloadResponse>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(record_download(
        &mut persistence,
        &material_id,
        &session.actor,
    )?))
}

// ============================================================================
// Logs and statistics
// ============================================================================

/// Handler for GET `/audit` endpoint.
async fn handle_list_audit(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(list_audit_events(
        &mut persistence,
        &query,
        &session.actor,
    )?))
}

/// Handler for GET `/audit/export` endpoint.
///
/// Returns the filtered audit trail as a CSV download.
async fn handle_export_audit(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Query(query): Query<AuditQuery>,
) -> Result<Response, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let csv: String = export_audit_csv(&mut persistence, &query, &session.actor)?;
    drop(persistence);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"audit-log.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Handler for GET `/deliveries` endpoint.
async fn handle_list_deliveries(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Query(query): Query<DeliveryLogQuery>,
) -> Result<Json<Vec<DeliveryLog>>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(list_delivery_logs(
        &mut persistence,
        &query,
        &session.actor,
    )?))
}

/// Handler for GET `/stats` endpoint.
async fn handle_statistics(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
) -> Result<Json<StatisticsResponse>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(get_statistics(&mut persistence, &session.actor)?))
}

// ============================================================================
// Settings
// ============================================================================

/// Handler for GET `/settings` endpoint.
async fn handle_get_settings(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
) -> Result<Json<SystemSettings>, HttpError> {
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    Ok(Json(get_settings(&mut persistence, &session.actor)?))
}

/// Handler for PUT `/settings` endpoint.
async fn handle_update_settings(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    RequestClient(client): RequestClient,
    Json(req): Json<SystemSettings>,
) -> Result<Json<SystemSettings>, HttpError> {
    info!(actor_id = %session.actor.id, "Handling update_settings request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let settings: SystemSettings =
        update_settings(&mut persistence, &req, &session.actor, &client, now())?;

    Ok(Json(settings))
}

/// Handler for POST `/settings/check/email` endpoint.
async fn handle_check_email(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Json(req): Json<ChannelCheckRequest>,
) -> Result<Json<ChannelCheckResponse>, HttpError> {
    let response: ChannelCheckResponse = check_email_channel(
        &app_state.persistence,
        app_state.dispatcher.email_sender(),
        &req,
        &session.actor,
        now(),
    )
    .await?;

    Ok(Json(response))
}

/// Handler for POST `/settings/check/whatsapp` endpoint.
async fn handle_check_whatsapp(
    AxumState(app_state): AxumState<AppState>,
    session: SessionAccount,
    Json(req): Json<ChannelCheckRequest>,
) -> Result<Json<ChannelCheckResponse>, HttpError> {
    let response: ChannelCheckResponse = check_whatsapp_channel(
        app_state.dispatcher.whatsapp_sender(),
        &req,
        &session.actor,
        now(),
    )
    .await?;

    Ok(Json(response))
}

/// Handler for GET `/health` endpoint.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState, edge_providers: Arc<EdgeProviders>) -> Router {
    Router::new()
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/me", get(handle_current_account))
        .route("/auth/password", post(handle_change_password))
        .route(
            "/accounts",
            get(handle_list_accounts).post(handle_create_account),
        )
        .route(
            "/accounts/{id}",
            axum::routing::put(handle_update_account).delete(handle_delete_account),
        )
        .route("/accounts/{id}/status", post(handle_set_account_active))
        .route(
            "/accounts/{id}/reset_password",
            post(handle_reset_password),
        )
        .route(
            "/materials",
            get(handle_list_materials).post(handle_upload_material),
        )
        .route("/materials/search", get(handle_search_materials))
        .route("/materials/subjects", get(handle_list_subjects))
        .route(
            "/materials/{id}",
            axum::routing::put(handle_update_material).delete(handle_delete_material),
        )
        .route("/materials/{id}/status", post(handle_set_material_active))
        .route("/materials/{id}/deliver", post(handle_deliver_material))
        .route("/materials/{id}/download", post(handle_record_download))
        .route("/audit", get(handle_list_audit))
        .route("/audit/export", get(handle_export_audit))
        .route("/deliveries", get(handle_list_deliveries))
        .route("/stats", get(handle_statistics))
        .route("/settings", get(handle_get_settings).put(handle_update_settings))
        .route("/settings/check/email", post(handle_check_email))
        .route("/settings/check/whatsapp", post(handle_check_whatsapp))
        .route("/health", get(handle_health))
        .with_state(app_state)
        .merge(edge::router(edge_providers))
        .layer(TraceLayer::new_for_http())
}

/// Builds the channel senders for the chosen delivery mode.
fn build_senders(
    args: &Args,
    http: &reqwest::Client,
    sendgrid: &SendGridClient,
    twilio: &TwilioClient,
) -> Result<(Arc<dyn EmailSender>, Arc<dyn WhatsAppSender>), Box<dyn std::error::Error>> {
    match args.delivery_mode {
        DeliveryMode::Log => {
            info!("Delivery mode: log only, nothing is sent");
            Ok((Arc::new(TracingSender), Arc::new(TracingSender)))
        }
        DeliveryMode::Direct => {
            if !sendgrid.is_configured() {
                warn!("SENDGRID_API_KEY is not set; email deliveries will fail");
            }
            if !twilio.is_configured() {
                warn!("Twilio credentials are not set; WhatsApp deliveries will fail");
            }
            info!("Delivery mode: direct provider calls");
            Ok((Arc::new(sendgrid.clone()), Arc::new(twilio.clone())))
        }
        DeliveryMode::Edge => {
            let base_url: &str = args
                .edge_functions_url
                .as_deref()
                .ok_or("EDGE_FUNCTIONS_URL is required in edge delivery mode")?;
            let client: EdgeFunctionClient = EdgeFunctionClient::new(
                http.clone(),
                base_url,
                args.edge_functions_key.clone().unwrap_or_default(),
            );
            info!(base_url, "Delivery mode: hosted functions");
            Ok((Arc::new(client.clone()), Arc::new(client)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("Initializing StudyQ Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let mut persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory store");
        Persistence::new_in_memory()?
    };
    if !args.no_seed {
        persistence.seed_demo_data(now())?;
    }
    let initial_settings: SystemSettings = args.initial_settings();
    initial_settings.validate()?;
    if persistence.seed_settings(&initial_settings)? {
        info!("Stored initial system settings");
    }

    let http: reqwest::Client = build_http_client(PROVIDER_TIMEOUT)?;
    let sendgrid: SendGridClient = SendGridClient::new(
        http.clone(),
        SendGridConfig::new(args.sendgrid_api_key.clone(), args.from_email.clone()),
    );
    let twilio: TwilioClient = TwilioClient::new(
        http.clone(),
        TwilioConfig::new(
            args.twilio_account_sid.clone(),
            args.twilio_auth_token.clone(),
            args.twilio_whatsapp_number.clone(),
        ),
    );
    let (email, whatsapp) = build_senders(&args, &http, &sendgrid, &twilio)?;

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        sessions: Arc::new(Mutex::new(SessionRegistry::new())),
        dispatcher: DeliveryDispatcher::new(email, whatsapp, &args.public_url),
    };
    let edge_providers: Arc<EdgeProviders> = Arc::new(EdgeProviders {
        email: sendgrid,
        whatsapp: twilio,
    });

    // Sweep expired sessions
    let sessions: Arc<Mutex<SessionRegistry>> = Arc::clone(&app_state.sessions);
    tokio::spawn(async move {
        let mut interval: tokio::time::Interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged: usize = sessions.lock().await.purge_expired(now());
            if purged > 0 {
                info!(purged, "Swept expired sessions");
            }
        }
    });

    // Apply audit retention
    let store: Arc<Mutex<Persistence>> = Arc::clone(&app_state.persistence);
    tokio::spawn(async move {
        let mut interval: tokio::time::Interval = tokio::time::interval(AUDIT_RETENTION_INTERVAL);
        loop {
            interval.tick().await;
            let mut persistence: MutexGuard<'_, Persistence> = store.lock().await;
            let pruned: Result<usize, ApiError> = persistence
                .load_settings()
                .map_err(ApiError::from)
                .and_then(|settings| apply_audit_retention(&mut persistence, &settings, now()));
            match pruned {
                Ok(0) => {}
                Ok(pruned) => info!(pruned, "Pruned audit events past retention"),
                Err(e) => warn!(error = %e, "Audit retention failed"),
            }
        }
    });

    // Build router
    let app: Router = build_router(app_state, edge_providers);

    // Bind to address
    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener: tokio::net::TcpListener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
