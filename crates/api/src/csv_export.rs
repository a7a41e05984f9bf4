// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV export of the audit trail.
//!
//! Rows are written in the order given; fields containing commas, quotes
//! or line breaks are quoted by the `csv` writer.

use studyq_audit::AuditEvent;
use time::format_description::well_known::Rfc3339;

use crate::error::ApiError;

/// Header row of the audit export.
pub const AUDIT_CSV_HEADER: [&str; 6] = [
    "Timestamp",
    "User",
    "Action",
    "Details",
    "IP Address",
    "User Agent",
];

fn export_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::Internal {
        message: format!("Failed to export audit log: {e}"),
    }
}

/// Renders audit events as CSV.
///
/// # Arguments
///
/// * `events` - The events to export, already filtered and ordered
///
/// # Errors
///
/// Returns an error if a timestamp cannot be formatted or the writer
/// fails.
pub fn export_audit_csv(events: &[&AuditEvent]) -> Result<String, ApiError> {
    let mut writer: csv::Writer<Vec<u8>> = csv::Writer::from_writer(Vec::new());
    writer.write_record(AUDIT_CSV_HEADER).map_err(export_error)?;

    for event in events {
        let timestamp: String = event.timestamp().format(&Rfc3339).map_err(export_error)?;
        writer
            .write_record([
                timestamp.as_str(),
                event.actor_name(),
                event.action().as_str(),
                event.details(),
                event.ip_address().unwrap_or_default(),
                event.user_agent().unwrap_or_default(),
            ])
            .map_err(export_error)?;
    }

    let bytes: Vec<u8> = writer.into_inner().map_err(export_error)?;
    String::from_utf8(bytes).map_err(export_error)
}
