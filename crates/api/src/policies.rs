// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The authentication policies derived from the system settings.

use studyq::LockoutPolicy;
use studyq_domain::SystemSettings;

use crate::password_policy::PasswordPolicy;
use crate::session::SessionPolicy;

/// Lockout, session and password policies in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityPolicies {
    /// Failed sign-in lockout.
    pub lockout: LockoutPolicy,
    /// Session lifetime.
    pub session: SessionPolicy,
    /// Password strength rules.
    pub password: PasswordPolicy,
}

impl SecurityPolicies {
    /// Builds every policy from one settings record.
    #[must_use]
    pub fn from_settings(settings: &SystemSettings) -> Self {
        Self {
            lockout: LockoutPolicy::from_settings(settings),
            session: SessionPolicy::from_settings(settings),
            password: PasswordPolicy::from_settings(settings),
        }
    }
}

impl Default for SecurityPolicies {
    fn default() -> Self {
        Self::from_settings(&SystemSettings::default())
    }
}
