// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! JSON bodies of the `send-email` and `send-whatsapp` functions.

use serde::{Deserialize, Serialize};

/// Body of a `send-email` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailFunctionRequest {
    /// Recipient address.
    #[serde(default)]
    pub to: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// HTML body.
    #[serde(default)]
    pub html: String,
    /// Material title, when attaching a material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_title: Option<String>,
    /// Material download link, when attaching a material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_url: Option<String>,
}

impl EmailFunctionRequest {
    /// Returns whether every required field is present.
    #[must_use]
    pub fn has_required_fields(&self) -> bool {
        !self.to.trim().is_empty() && !self.subject.trim().is_empty() && !self.html.is_empty()
    }
}

/// Body of a `send-whatsapp` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppFunctionRequest {
    /// Recipient number.
    #[serde(default)]
    pub to: String,
    /// Message text.
    #[serde(default)]
    pub message: String,
    /// Material title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_title: Option<String>,
    /// Material link, sent as media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_url: Option<String>,
}

impl WhatsAppFunctionRequest {
    /// Returns whether every required field is present.
    #[must_use]
    pub fn has_required_fields(&self) -> bool {
        !self.to.trim().is_empty() && !self.message.is_empty()
    }
}

/// Response body shared by both functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    /// Whether the provider accepted the message.
    pub success: bool,
    /// Result message on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider or synthetic delivery id on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
}

impl FunctionResponse {
    /// Creates a success body.
    #[must_use]
    pub const fn sent(message: String, delivery_id: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            error: None,
            delivery_id: Some(delivery_id),
        }
    }

    /// Creates a failure body.
    #[must_use]
    pub const fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
            delivery_id: None,
        }
    }
}
