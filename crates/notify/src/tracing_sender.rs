// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use async_trait::async_trait;
use studyq::ChannelReport;
use tracing::info;

use crate::message::{EmailMessage, WhatsAppMessage, synthetic_delivery_id};
use crate::sender::{EmailSender, WhatsAppSender};

/// Logs messages instead of sending them. Every send succeeds.
///
/// Used for local development and as the default delivery mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSender;

#[async_trait]
impl EmailSender for TracingSender {
    async fn send_email(&self, message: &EmailMessage) -> ChannelReport {
        info!(
            to = %message.to,
            subject = %message.subject,
            attachment = message.attachment.as_ref().map(|a| a.url.as_str()),
            "Email (not sent)"
        );
        ChannelReport::sent(
            format!("Email sent successfully to {}", message.to),
            Some(synthetic_delivery_id("EMAIL")),
        )
    }
}

#[async_trait]
impl WhatsAppSender for TracingSender {
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> ChannelReport {
        info!(
            to = %message.to,
            media_url = message.media_url.as_deref(),
            "WhatsApp message (not sent)"
        );
        ChannelReport::sent(
            format!("WhatsApp message sent successfully to {}", message.to),
            Some(synthetic_delivery_id("WA")),
        )
    }
}
