// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Errors raised by provider clients.
///
/// Sender trait implementations turn these into failed channel reports;
/// only the edge-function endpoints surface them directly.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Provider credentials are missing.
    #[error("{message}")]
    ProviderUnavailable {
        /// Which setting is missing.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("{provider} API error: {status}")]
    ProviderRejected {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// The request could not be sent or the response not read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not what the provider documents.
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl NotifyError {
    /// Creates a `ProviderUnavailable` error.
    #[must_use]
    pub fn unavailable(message: &str) -> Self {
        Self::ProviderUnavailable {
            message: message.to_string(),
        }
    }

    /// Returns whether this error stems from missing configuration.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }
}
