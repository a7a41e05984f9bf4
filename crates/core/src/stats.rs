// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use studyq_audit::{AuditEvent, AuditTrail};
use studyq_domain::{Account, DeliveryLog, Material};

/// Number of audit events shown as recent activity.
pub const RECENT_ACTIVITY_COUNT: usize = 5;

/// Portal-wide counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalStatistics {
    /// All accounts.
    pub total_users: usize,
    /// Accounts that may sign in.
    pub active_users: usize,
    /// Active materials.
    pub total_materials: usize,
    /// Delivery log entries.
    pub total_deliveries: usize,
    /// The most recent audit events, newest first.
    pub recent_activity: Vec<AuditEvent>,
}

/// Computes dashboard statistics from the current store contents.
#[must_use]
pub fn portal_statistics(
    accounts: &[Account],
    materials: &[Material],
    deliveries: &[DeliveryLog],
    trail: &AuditTrail,
) -> PortalStatistics {
    PortalStatistics {
        total_users: accounts.len(),
        active_users: accounts.iter().filter(|a| a.is_active).count(),
        total_materials: materials.iter().filter(|m| m.is_active).count(),
        total_deliveries: deliveries.len(),
        recent_activity: trail.recent(RECENT_ACTIVITY_COUNT).to_vec(),
    }
}
