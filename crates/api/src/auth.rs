// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use studyq::{LockoutPolicy, LockoutStatus};
use studyq_audit::Actor;
use studyq_domain::{Account, Material, Role};
use studyq_persistence::{Persistence, PersistenceError};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::session::{Session, SessionPolicy};

/// An authenticated account acting through the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The account id.
    pub id: String,
    /// Display name, recorded in audit events.
    pub name: String,
    /// The account's role.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The account id
    /// * `name` - The display name
    /// * `role` - The account's role
    #[must_use]
    pub const fn new(id: String, name: String, role: Role) -> Self {
        Self { id, name, role }
    }

    /// Builds the actor for a stored account.
    #[must_use]
    pub fn from_account(account: &Account) -> Self {
        Self::new(account.id.clone(), account.display_name(), account.role)
    }

    /// Converts this actor into the audit attribution.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.name.clone())
    }
}

fn require(
    actor: &AuthenticatedActor,
    allowed: &[Role],
    action: &str,
    required_role: &str,
) -> Result<(), AuthError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_role: required_role.to_string(),
        })
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks if an actor may create, edit, deactivate or delete accounts.
    ///
    /// Only admins manage accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_manage_accounts(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        require(actor, &[Role::Admin], "manage_accounts", "Admin")
    }

    /// Checks if an actor may upload material.
    ///
    /// # Errors
    ///
    /// Returns an error for students.
    pub fn authorize_upload_material(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        require(
            actor,
            &[Role::Admin, Role::Teacher],
            "upload_material",
            "Teacher",
        )
    }

    /// Checks if an actor may edit, deactivate or delete a material.
    ///
    /// Admins may change any material; teachers only their own uploads.
    ///
    /// # Errors
    ///
    /// Returns an error for students and for teachers who did not upload
    /// the material.
    pub fn authorize_modify_material(
        actor: &AuthenticatedActor,
        material: &Material,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Teacher if material.uploaded_by == actor.id => Ok(()),
            Role::Teacher => Err(AuthError::Unauthorized {
                action: String::from("modify_material"),
                required_role: String::from("Admin"),
            }),
            Role::Student => Err(AuthError::Unauthorized {
                action: String::from("modify_material"),
                required_role: String::from("Teacher"),
            }),
        }
    }

    /// Checks if an actor may read the audit trail or export it.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_view_audit(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        require(actor, &[Role::Admin], "view_audit", "Admin")
    }

    /// Checks if an actor may read dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_view_statistics(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        require(actor, &[Role::Admin], "view_statistics", "Admin")
    }

    /// Checks if an actor may read or change system settings and run
    /// channel checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_manage_settings(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        require(actor, &[Role::Admin], "manage_settings", "Admin")
    }

    /// Checks if an actor may deliver material to `student_id`.
    ///
    /// Students request delivery to themselves; admins may deliver to
    /// any student.
    ///
    /// # Errors
    ///
    /// Returns an error for teachers and for students targeting another
    /// account.
    pub fn authorize_deliver(
        actor: &AuthenticatedActor,
        student_id: &str,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Student if actor.id == student_id => Ok(()),
            Role::Student | Role::Teacher => Err(AuthError::Unauthorized {
                action: String::from("deliver_material"),
                required_role: String::from("Admin"),
            }),
        }
    }

    /// Checks if an actor may read the delivery log of `student_id`, or
    /// the whole log when `student_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the actor is an admin or the student
    /// themselves.
    pub fn authorize_view_deliveries(
        actor: &AuthenticatedActor,
        student_id: Option<&str>,
    ) -> Result<(), AuthError> {
        match (actor.role, student_id) {
            (Role::Admin, _) => Ok(()),
            (Role::Student, Some(id)) if id == actor.id => Ok(()),
            _ => Err(AuthError::Unauthorized {
                action: String::from("view_deliveries"),
                required_role: String::from("Admin"),
            }),
        }
    }
}

/// The result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    /// The account as persisted after the sign-in.
    pub account: Account,
    /// The new session.
    pub session: Session,
}

/// Authentication service: credential checks with lockout bookkeeping.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Authenticates a username and password and issues a session.
    ///
    /// Checks run in a fixed order: the account must exist, be active and
    /// not be locked before the password is compared. A failed comparison
    /// counts against the lockout policy; a successful one resets it. The
    /// updated account is persisted in both cases.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The credential store
    /// * `username` - The submitted username, matched exactly
    /// * `password` - The submitted password
    /// * `lockout` - Lockout thresholds
    /// * `sessions` - Session lifetime
    /// * `now` - The attempt time
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown username or a wrong
    /// password, `AccountInactive` for a deactivated account,
    /// `AccountLocked` while a lock is in force, and `StorageFailure` if
    /// the account cannot be read or saved.
    pub fn authenticate(
        persistence: &mut Persistence,
        username: &str,
        password: &str,
        lockout: &LockoutPolicy,
        sessions: &SessionPolicy,
        now: OffsetDateTime,
    ) -> Result<LoginSuccess, AuthError> {
        let mut account: Account = persistence
            .get_account_by_username(username)
            .map_err(Self::map_persistence_error)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.is_active {
            debug!(account_id = %account.id, "Sign-in refused for inactive account");
            return Err(AuthError::AccountInactive);
        }

        if let LockoutStatus::Locked { until } = lockout.status(&account, now) {
            debug!(account_id = %account.id, %until, "Sign-in refused for locked account");
            return Err(AuthError::AccountLocked { until });
        }

        if !Self::password_matches(&account, password) {
            let status: LockoutStatus = lockout.register_failure(&mut account, now);
            persistence
                .save_account(&account)
                .map_err(Self::map_persistence_error)?;
            match status {
                LockoutStatus::Locked { until } => {
                    warn!(account_id = %account.id, %until, "Account locked after repeated failures");
                }
                LockoutStatus::Unlocked { failed_attempts } => {
                    debug!(account_id = %account.id, failed_attempts, "Sign-in failed");
                }
            }
            return Err(AuthError::InvalidCredentials);
        }

        LockoutPolicy::register_success(&mut account, now);
        persistence
            .save_account(&account)
            .map_err(Self::map_persistence_error)?;

        let session: Session = Session::issue(&account, now, sessions);
        info!(account_id = %account.id, role = account.role.as_str(), "Sign-in succeeded");

        Ok(LoginSuccess { account, session })
    }

    /// Checks `password` against the account's stored hash.
    ///
    /// An empty password, a missing hash or an unreadable hash is a
    /// mismatch.
    #[must_use]
    pub fn password_matches(account: &Account, password: &str) -> bool {
        let Some(hash) = account.password_hash.as_deref() else {
            return false;
        };
        match Persistence::verify_password(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::StorageFailure(err.to_string())
    }
}
