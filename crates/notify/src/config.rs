// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::time::Duration;

/// Default sender address for outbound email.
pub const DEFAULT_FROM_EMAIL: &str = "noreply@studyq.edu";
/// Display name attached to outbound email.
pub const DEFAULT_FROM_NAME: &str = "StudyQ Platform";
/// Twilio sandbox sender used when no number is configured.
pub const DEFAULT_WHATSAPP_FROM: &str = "whatsapp:+14155238886";

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const TWILIO_API_BASE: &str = "https://api.twilio.com";
const USER_AGENT: &str = concat!("studyq/", env!("CARGO_PKG_VERSION"));

/// SendGrid settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendGridConfig {
    /// API key; email is unavailable without it.
    pub api_key: Option<String>,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
    /// Mail send endpoint.
    pub api_url: String,
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from_email: String::from(DEFAULT_FROM_EMAIL),
            from_name: String::from(DEFAULT_FROM_NAME),
            api_url: String::from(SENDGRID_API_URL),
        }
    }
}

impl SendGridConfig {
    /// Creates a configuration with the given key and sender, using the
    /// public SendGrid endpoint.
    #[must_use]
    pub fn new(api_key: Option<String>, from_email: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            from_email: from_email.unwrap_or_else(|| String::from(DEFAULT_FROM_EMAIL)),
            ..Self::default()
        }
    }
}

/// Twilio WhatsApp settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    /// Account SID.
    pub account_sid: Option<String>,
    /// Auth token.
    pub auth_token: Option<String>,
    /// Sender number in `whatsapp:+...` form.
    pub whatsapp_from: String,
    /// API base URL.
    pub api_base: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            whatsapp_from: String::from(DEFAULT_WHATSAPP_FROM),
            api_base: String::from(TWILIO_API_BASE),
        }
    }
}

impl TwilioConfig {
    /// Creates a configuration with the given credentials and sender,
    /// using the public Twilio endpoint.
    #[must_use]
    pub fn new(
        account_sid: Option<String>,
        auth_token: Option<String>,
        whatsapp_from: Option<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.filter(|sid| !sid.trim().is_empty()),
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
            whatsapp_from: whatsapp_from
                .unwrap_or_else(|| String::from(DEFAULT_WHATSAPP_FROM)),
            ..Self::default()
        }
    }
}

/// Builds the HTTP client shared by every provider client.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .build()
}
