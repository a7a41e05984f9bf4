// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Explicit session objects.
//!
//! Sessions are issued by the authenticator and held by the caller in a
//! `SessionRegistry`; nothing about the signed-in account is global.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use std::collections::HashMap;
use studyq_domain::{Account, Role, SystemSettings};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::AuthError;

/// Session lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// How long a session stays valid after sign-in.
    pub duration: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            duration: Duration::minutes(120),
        }
    }
}

impl SessionPolicy {
    /// Builds the policy from the stored system settings.
    #[must_use]
    pub fn from_settings(settings: &SystemSettings) -> Self {
        Self {
            duration: Duration::minutes(i64::from(settings.session_timeout)),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenClaims<'a> {
    account_id: &'a str,
    issued_at: i64,
    nonce: u64,
}

/// A signed-in account's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token.
    pub token: String,
    /// The signed-in account.
    pub account_id: String,
    /// The account's role at sign-in.
    pub role: Role,
    /// Sign-in time.
    pub issued_at: OffsetDateTime,
    /// The session is rejected from this instant.
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Issues a session for `account`.
    ///
    /// The token encodes the account id, issue time and a random nonce.
    /// It marks a session; it is not a signed credential.
    #[must_use]
    pub fn issue(account: &Account, now: OffsetDateTime, policy: &SessionPolicy) -> Self {
        let claims: TokenClaims<'_> = TokenClaims {
            account_id: &account.id,
            issued_at: now.unix_timestamp(),
            nonce: rand::random::<u64>(),
        };
        let raw: String = serde_json::to_string(&claims).unwrap_or_else(|_| {
            format!(
                "{}:{}:{}",
                claims.account_id, claims.issued_at, claims.nonce
            )
        });

        Self {
            token: URL_SAFE_NO_PAD.encode(raw),
            account_id: account.id.clone(),
            role: account.role,
            issued_at: now,
            expires_at: now + policy.duration,
        }
    }

    /// Returns whether the session has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// The set of live sessions, keyed by token.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session.
    pub fn insert(&mut self, session: Session) {
        debug!(account_id = %session.account_id, "Session registered");
        self.sessions.insert(session.token.clone(), session);
    }

    /// Looks up a live session.
    ///
    /// Expired sessions are removed on lookup.
    ///
    /// # Errors
    ///
    /// Returns `SessionInvalid` for an unknown token and `SessionExpired`
    /// once the session has lapsed.
    pub fn validate(&mut self, token: &str, now: OffsetDateTime) -> Result<Session, AuthError> {
        let session: &Session = self.sessions.get(token).ok_or(AuthError::SessionInvalid)?;
        if session.is_expired_at(now) {
            self.sessions.remove(token);
            return Err(AuthError::SessionExpired);
        }
        Ok(session.clone())
    }

    /// Removes one session.
    ///
    /// # Returns
    ///
    /// Whether the token was live.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Removes every session of an account, except `keep` if given.
    ///
    /// # Returns
    ///
    /// The number of sessions removed.
    pub fn revoke_for_account(&mut self, account_id: &str, keep: Option<&str>) -> usize {
        let before: usize = self.sessions.len();
        self.sessions
            .retain(|token, s| s.account_id != account_id || Some(token.as_str()) == keep);
        before - self.sessions.len()
    }

    /// Drops every expired session.
    ///
    /// # Returns
    ///
    /// The number of sessions removed.
    pub fn purge_expired(&mut self, now: OffsetDateTime) -> usize {
        let before: usize = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired_at(now));
        before - self.sessions.len()
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns whether no session is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

    fn account(id: &str) -> Account {
        Account::new(
            id.to_string(),
            format!("user.{id}"),
            format!("{id}@studyq.edu"),
            String::from("Test"),
            String::from("User"),
            Role::Teacher,
            NOW,
        )
    }

    #[test]
    fn test_session_lifetime_follows_settings() {
        let settings: SystemSettings = SystemSettings {
            session_timeout: 30,
            ..SystemSettings::default()
        };
        let session: Session = Session::issue(
            &account("TCH-1"),
            NOW,
            &SessionPolicy::from_settings(&settings),
        );
        assert_eq!(session.expires_at, NOW + Duration::minutes(30));
    }

    #[test]
    fn test_token_is_url_safe_and_decodes() {
        let session: Session = Session::issue(&account("TCH-1"), NOW, &SessionPolicy::default());
        assert!(
            session
                .token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        let decoded: Vec<u8> = URL_SAFE_NO_PAD.decode(&session.token).unwrap();
        let claims: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(claims["accountId"], "TCH-1");
        assert_eq!(claims["issuedAt"], NOW.unix_timestamp());
    }

    #[test]
    fn test_tokens_differ_for_same_instant() {
        let policy: SessionPolicy = SessionPolicy::default();
        let a: Session = Session::issue(&account("TCH-1"), NOW, &policy);
        let b: Session = Session::issue(&account("TCH-1"), NOW, &policy);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_validate_rejects_unknown_and_expired() {
        let mut registry: SessionRegistry = SessionRegistry::new();
        let session: Session = Session::issue(&account("TCH-1"), NOW, &SessionPolicy::default());
        let token: String = session.token.clone();
        registry.insert(session);

        assert!(registry.validate(&token, NOW + Duration::minutes(119)).is_ok());
        assert_eq!(
            registry.validate("bogus", NOW).unwrap_err(),
            AuthError::SessionInvalid
        );
        assert_eq!(
            registry
                .validate(&token, NOW + Duration::minutes(120))
                .unwrap_err(),
            AuthError::SessionExpired
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_revoke_for_account_keeps_current() {
        let mut registry: SessionRegistry = SessionRegistry::new();
        let policy: SessionPolicy = SessionPolicy::default();
        let current: Session = Session::issue(&account("TCH-1"), NOW, &policy);
        let keep: String = current.token.clone();
        registry.insert(current);
        registry.insert(Session::issue(&account("TCH-1"), NOW, &policy));
        registry.insert(Session::issue(&account("TCH-2"), NOW, &policy));

        assert_eq!(registry.revoke_for_account("TCH-1", Some(keep.as_str())), 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.revoke(&keep));
        assert!(!registry.revoke(&keep));
    }

    #[test]
    fn test_purge_expired() {
        let mut registry: SessionRegistry = SessionRegistry::new();
        registry.insert(Session::issue(
            &account("TCH-1"),
            NOW,
            &SessionPolicy::default(),
        ));
        assert_eq!(registry.purge_expired(NOW), 0);
        assert_eq!(registry.purge_expired(NOW + Duration::hours(3)), 1);
    }
}
