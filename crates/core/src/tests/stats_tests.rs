// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use studyq_audit::AuditTrail;
use studyq_domain::{Account, DeliveryLog, Material, Role};

use super::helpers::{
    create_test_account, create_test_delivery_log, create_test_event, create_test_material,
};
use crate::{PortalStatistics, RECENT_ACTIVITY_COUNT, portal_statistics};

#[test]
fn test_portal_statistics_counts() {
    let accounts: Vec<Account> = vec![
        create_test_account("a1", Role::Admin, true),
        create_test_account("t1", Role::Teacher, false),
        create_test_account("s1", Role::Student, true),
    ];
    let materials: Vec<Material> = vec![
        create_test_material("M1", true),
        create_test_material("M2", false),
    ];
    let deliveries: Vec<DeliveryLog> = vec![
        create_test_delivery_log("D1"),
        create_test_delivery_log("D2"),
    ];
    let mut trail: AuditTrail = AuditTrail::new();
    for minutes in 0..8 {
        trail.record(create_test_event(minutes));
    }

    let stats: PortalStatistics = portal_statistics(&accounts, &materials, &deliveries, &trail);

    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.active_users, 2);
    assert_eq!(stats.total_materials, 1);
    assert_eq!(stats.total_deliveries, 2);
    assert_eq!(stats.recent_activity.len(), RECENT_ACTIVITY_COUNT);
    assert_eq!(stats.recent_activity[0].details(), "event 7");
}

#[test]
fn test_portal_statistics_on_empty_stores() {
    let stats: PortalStatistics = portal_statistics(&[], &[], &[], &AuditTrail::new());
    assert_eq!(stats.total_users, 0);
    assert!(stats.recent_activity.is_empty());
}
