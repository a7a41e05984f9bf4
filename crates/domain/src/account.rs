// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::Role;

/// Academic placement carried only by student accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    /// The academic year the student is enrolled in.
    pub academic_year: u16,
    /// The student's current semester.
    pub current_semester: u8,
    /// WhatsApp number used for material delivery, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
}

impl StudentProfile {
    /// Creates a new student profile.
    ///
    /// # Arguments
    ///
    /// * `academic_year` - The academic year
    /// * `current_semester` - The current semester
    /// * `whatsapp_number` - Optional WhatsApp number
    #[must_use]
    pub const fn new(
        academic_year: u16,
        current_semester: u8,
        whatsapp_number: Option<String>,
    ) -> Self {
        Self {
            academic_year,
            current_semester,
            whatsapp_number,
        }
    }
}

/// A portal identity with credentials, role and lockout state.
///
/// Only a password hash is ever stored. Temporary passwords are handed
/// back to the creating admin once and never persisted in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique account identifier.
    pub id: String,
    /// Unique login name.
    pub username: String,
    /// Contact email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// The account's role.
    pub role: Role,
    /// Inactive accounts cannot sign in.
    pub is_active: bool,
    /// Set for new accounts and after an admin reset.
    pub must_change_password: bool,
    /// Consecutive failed sign-in attempts since the last success.
    #[serde(default)]
    pub failed_login_attempts: u32,
    /// Sign-in is refused until this instant.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub locked_until: Option<OffsetDateTime>,
    /// Time of the last successful sign-in.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// bcrypt hash of the current password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Student-only academic data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentProfile>,
}

impl Account {
    /// Creates a new active account with no credentials and a clean lockout state.
    ///
    /// # Arguments
    ///
    /// * `id` - The account identifier
    /// * `username` - The login name
    /// * `email` - The contact email address
    /// * `first_name` - The given name
    /// * `last_name` - The family name
    /// * `role` - The account role
    /// * `created_at` - The creation time
    #[must_use]
    pub const fn new(
        id: String,
        username: String,
        email: String,
        first_name: String,
        last_name: String,
        role: Role,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            username,
            email,
            first_name,
            last_name,
            role,
            is_active: true,
            must_change_password: false,
            failed_login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at,
            password_hash: None,
            student: None,
        }
    }

    /// Attaches a student profile to this account.
    #[must_use]
    pub fn with_student_profile(mut self, profile: StudentProfile) -> Self {
        self.student = Some(profile);
        self
    }

    /// Returns the "First Last" form of the account's name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns whether a lock is in force at `now`.
    ///
    /// An expired `locked_until` counts as unlocked even if it was never cleared.
    #[must_use]
    pub fn is_locked_at(&self, now: OffsetDateTime) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Returns whether this is a student account.
    #[must_use]
    pub const fn is_student(&self) -> bool {
        matches!(self.role, Role::Student)
    }

    /// Returns the WhatsApp number on file, if any.
    #[must_use]
    pub fn whatsapp_number(&self) -> Option<&str> {
        self.student
            .as_ref()
            .and_then(|profile| profile.whatsapp_number.as_deref())
            .filter(|number| !number.trim().is_empty())
    }
}
