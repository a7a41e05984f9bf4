// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

/// The role attached to an account.
///
/// Roles decide which portal surface an account may use. Admins manage
/// accounts and logs, teachers upload materials, students browse and
/// request delivery of materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Portal administrator.
    Admin,
    /// Teacher who uploads materials.
    Teacher,
    /// Student who receives materials.
    Student,
}

impl Role {
    /// Converts this role to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    /// Returns the prefix used when generating account identifiers.
    #[must_use]
    pub const fn id_prefix(&self) -> &'static str {
        match self {
            Self::Admin => "ADM",
            Self::Teacher => "TCH",
            Self::Student => "STD",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The transport(s) requested for a material delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    /// Email only.
    Email,
    /// WhatsApp only.
    WhatsApp,
    /// Email and WhatsApp, succeeding if either does.
    Both,
}

impl DeliveryChannel {
    /// Converts this channel to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::WhatsApp => "whatsapp",
            Self::Both => "both",
        }
    }

    /// Returns whether this request includes the email transport.
    #[must_use]
    pub const fn includes_email(&self) -> bool {
        matches!(self, Self::Email | Self::Both)
    }

    /// Returns whether this request includes the WhatsApp transport.
    #[must_use]
    pub const fn includes_whatsapp(&self) -> bool {
        matches!(self, Self::WhatsApp | Self::Both)
    }
}

impl FromStr for DeliveryChannel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "whatsapp" => Ok(Self::WhatsApp),
            "both" => Ok(Self::Both),
            _ => Err(DomainError::InvalidDeliveryChannel(s.to_string())),
        }
    }
}

impl std::fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The recorded outcome of a delivery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Not yet attempted.
    Pending,
    /// At least one requested channel succeeded.
    Sent,
    /// Every requested channel failed.
    Failed,
}

impl DeliveryStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(DomainError::InvalidDeliveryStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
