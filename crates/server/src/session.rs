// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction for the server.
//!
//! This module provides Axum extractors for validating bearer tokens and
//! for capturing the request origin recorded in the audit trail.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use studyq_api::{AuthenticatedActor, SessionRegistry, authenticate_session};
use studyq_audit::ClientContext;
use studyq_domain::Account;
use studyq_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::MutexGuard;
use tracing::{debug, warn};

use crate::{AppState, ErrorResponse};

/// Extractor for signed-in accounts.
///
/// Validates `Authorization: Bearer <token>` and resolves the session to
/// the account behind it.
///
/// # Usage
///
/// ```ignore
/// async fn my_handler(
///     SessionAccount { actor, .. }: SessionAccount,
/// ) -> Result<Json<Response>, HttpError> {
///     Ok(Json(Response { ... }))
/// }
/// ```
///
/// # Errors
///
/// Rejects with HTTP 401 if the header is missing or malformed, or the
/// session is unknown, expired, or belongs to a deactivated account.
pub struct SessionAccount {
    /// The caller, for authorization checks and audit attribution.
    pub actor: AuthenticatedActor,
    /// The caller's account as currently stored.
    pub account: Account,
    /// The bearer token, for logout and password changes.
    pub token: String,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, SessionError> {
    let value: &str = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            debug!("Missing Authorization header");
            SessionError::MissingAuthorizationHeader
        })?
        .to_str()
        .map_err(|_| {
            warn!("Invalid Authorization header encoding");
            SessionError::InvalidAuthorizationHeader
        })?;

    value.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Authorization header does not start with 'Bearer '");
        SessionError::InvalidAuthorizationHeader
    })
}

impl FromRequestParts<AppState> for SessionAccount {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token: String = bearer_token(&parts.headers)?.to_string();

        let mut persistence: MutexGuard<'_, Persistence> = state.persistence.lock().await;
        let mut sessions: MutexGuard<'_, SessionRegistry> = state.sessions.lock().await;
        let (actor, account) = authenticate_session(
            &mut persistence,
            &mut sessions,
            &token,
            OffsetDateTime::now_utc(),
        )
        .map_err(|e| {
            warn!(error = %e, "Session validation failed");
            SessionError::InvalidSession(e.to_string())
        })?;
        drop(sessions);
        drop(persistence);

        debug!(
            account_id = %actor.id,
            role = %actor.role,
            "Session validated successfully"
        );

        Ok(Self {
            actor,
            account,
            token,
        })
    }
}

/// Session extraction errors.
#[derive(Debug)]
pub enum SessionError {
    /// Authorization header is missing.
    MissingAuthorizationHeader,
    /// Authorization header format is invalid.
    InvalidAuthorizationHeader,
    /// Session validation failed.
    InvalidSession(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::MissingAuthorizationHeader => String::from("Missing Authorization header"),
            Self::InvalidAuthorizationHeader => String::from(
                "Invalid Authorization header format. Expected: 'Bearer <token>'",
            ),
            Self::InvalidSession(reason) => reason,
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: true,
                message,
            }),
        )
            .into_response()
    }
}

/// The request origin: first `X-Forwarded-For` hop (or `X-Real-IP`) and
/// the `User-Agent` header.
pub struct RequestClient(pub ClientContext);

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

impl<S: Send + Sync> FromRequestParts<S> for RequestClient {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded: Option<String> = header_value(&parts.headers, "x-forwarded-for")
            .and_then(|list| list.split(',').next().map(|hop| hop.trim().to_string()));
        let ip_address: Option<String> =
            forwarded.or_else(|| header_value(&parts.headers, "x-real-ip"));
        let user_agent: Option<String> =
            header_value(&parts.headers, header::USER_AGENT.as_str());

        Ok(Self(ClientContext::new(ip_address, user_agent)))
    }
}
