// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Twilio WhatsApp client.

use async_trait::async_trait;
use serde::Deserialize;
use studyq::ChannelReport;
use tracing::{debug, info, warn};

use crate::config::TwilioConfig;
use crate::error::NotifyError;
use crate::message::{WhatsAppMessage, synthetic_delivery_id};
use crate::sender::WhatsAppSender;

const PROVIDER: &str = "Twilio";
const WHATSAPP_PREFIX: &str = "whatsapp:";

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

/// Adds the `whatsapp:` prefix Twilio expects, unless already present.
#[must_use]
pub fn normalize_whatsapp_address(number: &str) -> String {
    let trimmed: &str = number.trim();
    if trimmed.starts_with(WHATSAPP_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{trimmed}")
    }
}

/// Sends WhatsApp messages through the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioClient {
    /// Creates a client using a shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client, config: TwilioConfig) -> Self {
        Self { http, config }
    }

    /// Returns whether both credentials are configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.account_sid.is_some() && self.config.auth_token.is_some()
    }

    /// Sends one WhatsApp message.
    ///
    /// # Arguments
    ///
    /// * `to` - Recipient number; normalised to `whatsapp:` form
    /// * `body` - Message text
    /// * `media_url` - Optional media link
    ///
    /// # Returns
    ///
    /// The Twilio message SID, or a synthetic `WA_<ms>` id when the
    /// response carries none.
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` without credentials, `ProviderRejected`
    /// on a non-success status, and `Http` on transport failure.
    pub async fn send_message(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<String, NotifyError> {
        let (Some(account_sid), Some(auth_token)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_deref(),
        ) else {
            return Err(NotifyError::unavailable("Twilio credentials not configured"));
        };

        let recipient: String = normalize_whatsapp_address(to);
        let url: String = format!(
            "{}/2010-04-01/Accounts/{account_sid}/Messages.json",
            self.config.api_base.trim_end_matches('/')
        );

        let mut form: Vec<(&str, &str)> = vec![
            ("From", self.config.whatsapp_from.as_str()),
            ("To", recipient.as_str()),
            ("Body", body),
        ];
        if let Some(media_url) = media_url {
            form.push(("MediaUrl", media_url));
        }

        debug!(to = %recipient, "Posting message to Twilio");

        let response: reqwest::Response = self
            .http
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&form)
            .send()
            .await?;

        let status: reqwest::StatusCode = response.status();
        if !status.is_success() {
            let body: String = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Twilio rejected message");
            return Err(NotifyError::ProviderRejected {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| NotifyError::InvalidResponse(e.to_string()))?;
        let delivery_id: String = resource
            .sid
            .unwrap_or_else(|| synthetic_delivery_id("WA"));

        info!(to = %recipient, delivery_id = %delivery_id, "WhatsApp message accepted by Twilio");
        Ok(delivery_id)
    }
}

#[async_trait]
impl WhatsAppSender for TwilioClient {
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> ChannelReport {
        match self
            .send_message(&message.to, &message.body, message.media_url.as_deref())
            .await
        {
            Ok(delivery_id) => ChannelReport::sent(
                format!("WhatsApp message sent successfully to {}", message.to),
                Some(delivery_id),
            ),
            Err(e) => {
                warn!(error = %e, to = %message.to, "WhatsApp delivery failed");
                ChannelReport::failed(e.to_string())
            }
        }
    }
}
