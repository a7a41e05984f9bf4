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

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

#[cfg(test)]
mod tests;

/// Maximum number of events retained by an `AuditTrail`.
pub const AUDIT_LOG_CAPACITY: usize = 1000;

/// Actor id recorded for sign-in attempts that matched no account.
pub const ANONYMOUS_ACTOR_ID: &str = "anonymous";

/// Represents the account performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The account identifier, or `anonymous`.
    pub id: String,
    /// The display name recorded alongside the id.
    pub name: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The account identifier
    /// * `name` - The display name
    #[must_use]
    pub const fn new(id: String, name: String) -> Self {
        Self { id, name }
    }

    /// Creates the actor for a failed sign-in, named after the submitted username.
    #[must_use]
    pub fn anonymous(username: &str) -> Self {
        Self {
            id: String::from(ANONYMOUS_ACTOR_ID),
            name: username.to_string(),
        }
    }
}

/// Where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    /// Remote address, when known.
    pub ip_address: Option<String>,
    /// User agent header, when known.
    pub user_agent: Option<String>,
}

impl ClientContext {
    /// Creates a new `ClientContext`.
    ///
    /// # Arguments
    ///
    /// * `ip_address` - The remote address
    /// * `user_agent` - The user agent string
    #[must_use]
    pub const fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// The kind of action recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Successful sign-in.
    Login,
    /// Rejected sign-in.
    LoginFailed,
    /// Sign-out.
    Logout,
    /// Account created.
    UserCreate,
    /// Account details edited.
    UserUpdate,
    /// Account removed.
    UserDelete,
    /// Account activated or deactivated.
    UserStatusChange,
    /// Password changed by its owner.
    PasswordChange,
    /// Password reset by an admin.
    PasswordReset,
    /// Material uploaded.
    MaterialUpload,
    /// Material edited or activated/deactivated.
    MaterialUpdate,
    /// Material removed.
    MaterialDelete,
    /// System settings changed.
    SettingsUpdate,
}

impl AuditAction {
    /// Converts this action to its tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::Logout => "LOGOUT",
            Self::UserCreate => "USER_CREATE",
            Self::UserUpdate => "USER_UPDATE",
            Self::UserDelete => "USER_DELETE",
            Self::UserStatusChange => "USER_STATUS_CHANGE",
            Self::PasswordChange => "PASSWORD_CHANGE",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::MaterialUpload => "MATERIAL_UPLOAD",
            Self::MaterialUpdate => "MATERIAL_UPDATE",
            Self::MaterialDelete => "MATERIAL_DELETE",
            Self::SettingsUpdate => "SETTINGS_UPDATE",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOGIN" => Ok(Self::Login),
            "LOGIN_FAILED" => Ok(Self::LoginFailed),
            "LOGOUT" => Ok(Self::Logout),
            "USER_CREATE" => Ok(Self::UserCreate),
            "USER_UPDATE" => Ok(Self::UserUpdate),
            "USER_DELETE" => Ok(Self::UserDelete),
            "USER_STATUS_CHANGE" => Ok(Self::UserStatusChange),
            "PASSWORD_CHANGE" => Ok(Self::PasswordChange),
            "PASSWORD_RESET" => Ok(Self::PasswordReset),
            "MATERIAL_UPLOAD" => Ok(Self::MaterialUpload),
            "MATERIAL_UPDATE" => Ok(Self::MaterialUpdate),
            "MATERIAL_DELETE" => Ok(Self::MaterialDelete),
            "SETTINGS_UPDATE" => Ok(Self::SettingsUpdate),
            _ => Err(format!("Unknown audit action: {s}")),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable record of a security- or content-relevant action.
///
/// Fields are private so an event cannot change after it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    id: String,
    actor_id: String,
    actor_name: String,
    action: AuditAction,
    details: String,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
}

impl AuditEvent {
    /// Creates a new `AuditEvent` with a fresh identifier.
    ///
    /// # Arguments
    ///
    /// * `actor` - Who performed the action
    /// * `action` - What was done
    /// * `details` - Free-text description
    /// * `client` - Where the request came from
    /// * `timestamp` - When it happened
    #[must_use]
    pub fn new(
        actor: Actor,
        action: AuditAction,
        details: String,
        client: ClientContext,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id: actor.id,
            actor_name: actor.name,
            action,
            details,
            timestamp,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the actor identifier.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Returns the actor name.
    #[must_use]
    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    /// Returns the recorded action.
    #[must_use]
    pub const fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the free-text details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Returns when the event happened.
    #[must_use]
    pub const fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Returns the remote address, if recorded.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Returns the user agent, if recorded.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// A bounded, newest-first sequence of audit events.
///
/// Recording past capacity evicts the oldest events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
}

impl AuditTrail {
    /// Creates an empty trail.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Builds a trail from stored events, assumed newest first.
    ///
    /// Anything beyond capacity is dropped from the tail.
    #[must_use]
    pub fn from_events(mut events: Vec<AuditEvent>) -> Self {
        events.truncate(AUDIT_LOG_CAPACITY);
        Self { events }
    }

    /// Inserts an event at the head and evicts from the tail past capacity.
    pub fn record(&mut self, event: AuditEvent) {
        self.events.insert(0, event);
        self.events.truncate(AUDIT_LOG_CAPACITY);
    }

    /// Returns all events, newest first.
    #[must_use]
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Returns the number of retained events.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns whether the trail is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops events older than `cutoff`.
    ///
    /// # Returns
    ///
    /// How many events were dropped.
    pub fn retain_since(&mut self, cutoff: OffsetDateTime) -> usize {
        let before: usize = self.events.len();
        self.events.retain(|event| event.timestamp >= cutoff);
        before - self.events.len()
    }

    /// Returns the events recorded for one actor, newest first.
    #[must_use]
    pub fn by_actor(&self, actor_id: &str) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|event| event.actor_id == actor_id)
            .collect()
    }

    /// Returns the events of one kind, newest first.
    #[must_use]
    pub fn by_action(&self, action: AuditAction) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|event| event.action == action)
            .collect()
    }

    /// Returns the events whose timestamp lies in `[start, end]`, newest first.
    #[must_use]
    pub fn in_range(&self, start: OffsetDateTime, end: OffsetDateTime) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|event| event.timestamp >= start && event.timestamp <= end)
            .collect()
    }

    /// Returns the events whose actor name, action tag or details contain
    /// `term`, ignoring case.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&AuditEvent> {
        let needle: String = term.trim().to_lowercase();
        self.events
            .iter()
            .filter(|event| {
                needle.is_empty()
                    || event.actor_name.to_lowercase().contains(&needle)
                    || event.action.as_str().to_lowercase().contains(&needle)
                    || event.details.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Returns the `count` most recent events.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[AuditEvent] {
        &self.events[..count.min(self.events.len())]
    }
}
