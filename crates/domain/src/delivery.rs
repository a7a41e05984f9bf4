// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{DeliveryChannel, DeliveryStatus};

/// The recorded outcome of one delivery request.
///
/// Titles and names are copied at delivery time so the log stays readable
/// after the material or account is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLog {
    /// Unique log identifier.
    pub id: String,
    /// Identifier of the delivered material.
    pub material_id: String,
    /// Material title at delivery time.
    pub material_title: String,
    /// Identifier of the receiving student.
    pub student_id: String,
    /// Student name at delivery time.
    pub student_name: String,
    /// The channel(s) requested.
    pub channel: DeliveryChannel,
    /// Aggregated outcome.
    pub status: DeliveryStatus,
    /// Human-readable outcome message.
    #[serde(default)]
    pub message: String,
    /// When the attempt finished.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Email address used, when email was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<String>,
    /// WhatsApp number used, when WhatsApp was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_whatsapp: Option<String>,
}
