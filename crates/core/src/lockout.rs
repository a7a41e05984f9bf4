// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Sign-in lockout policy.
//!
//! An account moves from unlocked to locked on its Nth consecutive failed
//! sign-in and back to unlocked once the lock window has passed. Attempts
//! made while locked are rejected before they are counted.

use studyq_domain::{Account, SystemSettings};
use time::{Duration, OffsetDateTime};

/// Default number of consecutive failures that triggers a lock.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Default lock window.
pub const DEFAULT_LOCK_DURATION: Duration = Duration::minutes(15);

/// The lockout state of an account at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    /// Sign-in may proceed.
    Unlocked {
        /// Consecutive failures counted so far.
        failed_attempts: u32,
    },
    /// Sign-in is refused until `until`.
    Locked {
        /// End of the lock window.
        until: OffsetDateTime,
    },
}

impl LockoutStatus {
    /// Returns whether this status refuses sign-in.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// Lockout thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock.
    pub max_failed_attempts: u32,
    /// How long a lock lasts.
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lock_duration: DEFAULT_LOCK_DURATION,
        }
    }
}

impl LockoutPolicy {
    /// Builds the policy from the stored system settings.
    #[must_use]
    pub fn from_settings(settings: &SystemSettings) -> Self {
        Self {
            max_failed_attempts: settings.max_login_attempts,
            lock_duration: Duration::minutes(i64::from(settings.lockout_duration)),
        }
    }

    /// Returns the lockout status of `account` at `now`.
    #[must_use]
    pub fn status(&self, account: &Account, now: OffsetDateTime) -> LockoutStatus {
        match account.locked_until {
            Some(until) if until > now => LockoutStatus::Locked { until },
            _ => LockoutStatus::Unlocked {
                failed_attempts: account.failed_login_attempts,
            },
        }
    }

    /// Counts a failed sign-in against `account`.
    ///
    /// Callers must check `status` first; a failure while locked is never
    /// passed here. An expired lock does not reset the counter: only a
    /// successful sign-in does, so the next failure after expiry re-locks.
    ///
    /// # Returns
    ///
    /// The status after counting the failure.
    pub fn register_failure(&self, account: &mut Account, now: OffsetDateTime) -> LockoutStatus {
        account.failed_login_attempts = account.failed_login_attempts.saturating_add(1);

        if account.failed_login_attempts >= self.max_failed_attempts {
            let until: OffsetDateTime = now + self.lock_duration;
            account.locked_until = Some(until);
            return LockoutStatus::Locked { until };
        }

        LockoutStatus::Unlocked {
            failed_attempts: account.failed_login_attempts,
        }
    }

    /// Records a successful sign-in: clears the counter and any lock and
    /// stamps the last login time.
    pub const fn register_success(account: &mut Account, now: OffsetDateTime) {
        account.failed_login_attempts = 0;
        account.locked_until = None;
        account.last_login = Some(now);
    }

    /// Clears the counter and any lock, as an admin password reset does.
    pub const fn clear(account: &mut Account) {
        account.failed_login_attempts = 0;
        account.locked_until = None;
    }
}
