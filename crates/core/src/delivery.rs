// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Multi-channel delivery aggregation.
//!
//! A delivery request names one or both channels. Each attempted channel
//! yields a `ChannelReport`; `aggregate` folds them into the single outcome
//! that is logged and shown to the student.

use serde::{Deserialize, Serialize};
use studyq_domain::{DeliveryChannel, DeliveryStatus};

/// Message when email and WhatsApp both succeed.
pub const BOTH_SUCCEEDED: &str = "Material delivered successfully via both email and WhatsApp";
/// Message when only email succeeds.
pub const EMAIL_ONLY_SUCCEEDED: &str = "Material delivered via email (WhatsApp failed)";
/// Message when only WhatsApp succeeds.
pub const WHATSAPP_ONLY_SUCCEEDED: &str = "Material delivered via WhatsApp (Email failed)";
/// Message when both channels fail.
pub const BOTH_FAILED: &str = "Failed to deliver material via both methods";
/// Message returned when sending broke unexpectedly.
pub const SYSTEM_FAILURE: &str = "Failed to deliver material due to system error";

/// The result reported by one channel sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelReport {
    /// Whether the provider accepted the message.
    pub success: bool,
    /// Human-readable result.
    pub message: String,
    /// Provider-assigned identifier, when sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
}

impl ChannelReport {
    /// Creates a successful report.
    ///
    /// # Arguments
    ///
    /// * `message` - The result message
    /// * `delivery_id` - The provider identifier, if any
    #[must_use]
    pub const fn sent(message: String, delivery_id: Option<String>) -> Self {
        Self {
            success: true,
            message,
            delivery_id,
        }
    }

    /// Creates a failed report.
    #[must_use]
    pub const fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            delivery_id: None,
        }
    }
}

/// The aggregated result of a delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Whether at least one requested channel succeeded.
    pub success: bool,
    /// Human-readable result.
    pub message: String,
}

impl DeliveryOutcome {
    /// The outcome used when sending broke before any report was produced.
    #[must_use]
    pub fn system_failure() -> Self {
        Self {
            success: false,
            message: String::from(SYSTEM_FAILURE),
        }
    }

    /// Maps the outcome to the status stored in the delivery log.
    #[must_use]
    pub const fn status(&self) -> DeliveryStatus {
        if self.success {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        }
    }
}

/// Folds per-channel reports into one outcome.
///
/// Single-channel requests pass that channel's report through unchanged.
/// A `Both` request succeeds if either channel did. A requested channel
/// with no report counts as failed.
#[must_use]
pub fn aggregate(
    channel: DeliveryChannel,
    email: Option<&ChannelReport>,
    whatsapp: Option<&ChannelReport>,
) -> DeliveryOutcome {
    match channel {
        DeliveryChannel::Email => pass_through(email, "Email"),
        DeliveryChannel::WhatsApp => pass_through(whatsapp, "WhatsApp"),
        DeliveryChannel::Both => {
            let email_ok: bool = email.is_some_and(|report| report.success);
            let whatsapp_ok: bool = whatsapp.is_some_and(|report| report.success);
            let message: &str = match (email_ok, whatsapp_ok) {
                (true, true) => BOTH_SUCCEEDED,
                (true, false) => EMAIL_ONLY_SUCCEEDED,
                (false, true) => WHATSAPP_ONLY_SUCCEEDED,
                (false, false) => BOTH_FAILED,
            };
            DeliveryOutcome {
                success: email_ok || whatsapp_ok,
                message: String::from(message),
            }
        }
    }
}

fn pass_through(report: Option<&ChannelReport>, label: &str) -> DeliveryOutcome {
    report.map_or_else(
        || DeliveryOutcome {
            success: false,
            message: format!("{label} delivery was not attempted"),
        },
        |report| DeliveryOutcome {
            success: report.success,
            message: report.message.clone(),
        },
    )
}
