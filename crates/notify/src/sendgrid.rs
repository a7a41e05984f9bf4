// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! SendGrid v3 mail client.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use studyq::ChannelReport;
use tracing::{debug, info, warn};

use crate::config::SendGridConfig;
use crate::error::NotifyError;
use crate::message::{Attachment, EmailMessage, plain_text_to_html, synthetic_delivery_id};
use crate::sender::EmailSender;

const PROVIDER: &str = "SendGrid";

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    content: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<MailAttachment>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
    subject: &'a str,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MailAttachment {
    content: String,
    filename: String,
    #[serde(rename = "type")]
    content_type: &'static str,
    disposition: &'static str,
}

impl MailAttachment {
    /// SendGrid requires base64 content; the download link is attached as
    /// a small text file since the material itself is not stored.
    fn from_link(attachment: &Attachment) -> Self {
        Self {
            content: STANDARD.encode(format!("{}\n", attachment.url)),
            filename: format!("{} (download link).txt", attachment.title),
            content_type: "text/plain",
            disposition: "attachment",
        }
    }
}

/// Sends email through the SendGrid v3 API.
#[derive(Debug, Clone)]
pub struct SendGridClient {
    http: reqwest::Client,
    config: SendGridConfig,
}

impl SendGridClient {
    /// Creates a client using a shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client, config: SendGridConfig) -> Self {
        Self { http, config }
    }

    /// Returns whether an API key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Sends an HTML email.
    ///
    /// # Arguments
    ///
    /// * `to` - Recipient address
    /// * `subject` - Subject line
    /// * `html` - HTML body
    /// * `attachment` - Optional material link to attach
    ///
    /// # Returns
    ///
    /// The provider message id, or a synthetic `EMAIL_<ms>` id when the
    /// provider does not return one.
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` without an API key, `ProviderRejected`
    /// on a non-success status, and `Http` on transport failure.
    pub async fn send_html(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachment: Option<&Attachment>,
    ) -> Result<String, NotifyError> {
        let api_key: &str = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| NotifyError::unavailable("SendGrid API key not configured"))?;

        let request: MailRequest<'_> = MailRequest {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: to,
                    name: None,
                }],
                subject,
            }],
            from: Address {
                email: &self.config.from_email,
                name: Some(&self.config.from_name),
            },
            content: vec![Content {
                content_type: "text/html",
                value: html,
            }],
            attachments: attachment.map(MailAttachment::from_link).into_iter().collect(),
        };

        debug!(to, subject, "Posting mail to SendGrid");

        let response: reqwest::Response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status: reqwest::StatusCode = response.status();
        if !status.is_success() {
            let body: String = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "SendGrid rejected mail");
            return Err(NotifyError::ProviderRejected {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let delivery_id: String = response
            .headers()
            .get("x-message-id")
            .and_then(|value| value.to_str().ok())
            .map_or_else(|| synthetic_delivery_id("EMAIL"), String::from);

        info!(to, delivery_id = %delivery_id, "Email accepted by SendGrid");
        Ok(delivery_id)
    }
}

#[async_trait]
impl EmailSender for SendGridClient {
    async fn send_email(&self, message: &EmailMessage) -> ChannelReport {
        let html: String = plain_text_to_html(&message.body);
        match self
            .send_html(
                &message.to,
                &message.subject,
                &html,
                message.attachment.as_ref(),
            )
            .await
        {
            Ok(delivery_id) => ChannelReport::sent(
                format!("Email sent successfully to {}", message.to),
                Some(delivery_id),
            ),
            Err(e) => {
                warn!(error = %e, to = %message.to, "Email delivery failed");
                ChannelReport::failed(e.to_string())
            }
        }
    }
}
