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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod catalog;
mod delivery;
mod lockout;
mod stats;
mod templates;

#[cfg(test)]
mod tests;

pub use catalog::{
    MaterialQuery, materials_by_uploader, materials_for_student, search_materials, subjects,
};
pub use delivery::{
    BOTH_FAILED, BOTH_SUCCEEDED, ChannelReport, DeliveryOutcome, EMAIL_ONLY_SUCCEEDED,
    SYSTEM_FAILURE, WHATSAPP_ONLY_SUCCEEDED, aggregate,
};
pub use lockout::{
    DEFAULT_LOCK_DURATION, DEFAULT_MAX_FAILED_ATTEMPTS, LockoutPolicy, LockoutStatus,
};
pub use stats::{PortalStatistics, RECENT_ACTIVITY_COUNT, portal_statistics};
pub use templates::{
    LINK_VALIDITY_HOURS, RenderedEmail, channel_check_email, channel_check_whatsapp,
    download_link, login_credentials_email, material_email, material_whatsapp,
    password_reset_email,
};
