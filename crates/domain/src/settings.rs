// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::DomainError;

/// Accepted range for `max_login_attempts`.
pub const MAX_LOGIN_ATTEMPTS_RANGE: RangeInclusive<u32> = 1..=10;
/// Accepted range for `lockout_duration`, in minutes.
pub const LOCKOUT_DURATION_RANGE: RangeInclusive<u32> = 5..=60;
/// Accepted range for `password_min_length`.
pub const PASSWORD_MIN_LENGTH_RANGE: RangeInclusive<u32> = 6..=20;
/// Accepted range for `session_timeout`, in minutes.
pub const SESSION_TIMEOUT_RANGE: RangeInclusive<u32> = 30..=480;
/// Accepted range for `audit_retention_days`.
pub const AUDIT_RETENTION_DAYS_RANGE: RangeInclusive<u32> = 30..=365;

/// Portal-wide security and notification settings, edited by admins.
///
/// Stored documents missing a field take that field's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemSettings {
    /// Consecutive failed sign-ins before an account is locked.
    pub max_login_attempts: u32,
    /// Lock duration in minutes.
    pub lockout_duration: u32,
    /// Minimum password length.
    pub password_min_length: u32,
    /// Passwords need a symbol.
    pub require_special_chars: bool,
    /// Passwords need a digit.
    pub require_numbers: bool,
    /// Passwords need an uppercase letter.
    pub require_uppercase: bool,
    /// Passwords need a lowercase letter.
    pub require_lowercase: bool,
    /// Session lifetime in minutes.
    pub session_timeout: u32,
    /// Credential and reset emails go out automatically.
    pub email_notifications: bool,
    /// Audit events older than this many days are pruned.
    pub audit_retention_days: u32,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_duration: 15,
            password_min_length: 8,
            require_special_chars: true,
            require_numbers: true,
            require_uppercase: true,
            require_lowercase: true,
            session_timeout: 120,
            email_notifications: true,
            audit_retention_days: 90,
        }
    }
}

impl SystemSettings {
    /// Checks every numeric setting against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns `SettingOutOfRange` for the first setting outside its range.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_range(
            "maxLoginAttempts",
            self.max_login_attempts,
            &MAX_LOGIN_ATTEMPTS_RANGE,
        )?;
        check_range(
            "lockoutDuration",
            self.lockout_duration,
            &LOCKOUT_DURATION_RANGE,
        )?;
        check_range(
            "passwordMinLength",
            self.password_min_length,
            &PASSWORD_MIN_LENGTH_RANGE,
        )?;
        check_range(
            "sessionTimeout",
            self.session_timeout,
            &SESSION_TIMEOUT_RANGE,
        )?;
        check_range(
            "auditRetentionDays",
            self.audit_retention_days,
            &AUDIT_RETENTION_DAYS_RANGE,
        )
    }
}

fn check_range(
    setting: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), DomainError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(DomainError::SettingOutOfRange {
            setting,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
