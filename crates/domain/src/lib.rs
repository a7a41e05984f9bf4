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

mod account;
mod delivery;
mod error;
mod material;
mod settings;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use account::{Account, StudentProfile};
pub use delivery::DeliveryLog;
pub use error::DomainError;
pub use material::Material;
pub use settings::{
    AUDIT_RETENTION_DAYS_RANGE, LOCKOUT_DURATION_RANGE, MAX_LOGIN_ATTEMPTS_RANGE,
    PASSWORD_MIN_LENGTH_RANGE, SESSION_TIMEOUT_RANGE, SystemSettings,
};
pub use types::{DeliveryChannel, DeliveryStatus, Role};
pub use validation::{
    ALLOWED_FILE_EXTENSIONS, MAX_FILE_SIZE_BYTES, MAX_SEMESTER, file_extension, mime_type_for,
    parse_tags, username_for, validate_academic_year, validate_account_fields,
    validate_account_unique, validate_email, validate_file, validate_material_fields,
    validate_semester, validate_username, validate_whatsapp_number,
};
