// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use async_trait::async_trait;
use studyq::ChannelReport;

use crate::message::{EmailMessage, WhatsAppMessage};

/// Sends email.
///
/// Implementations never return errors: provider or transport failures
/// come back as a report with `success == false`.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends one email and reports the outcome.
    async fn send_email(&self, message: &EmailMessage) -> ChannelReport;
}

/// Sends WhatsApp messages.
///
/// Same failure contract as `EmailSender`.
#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    /// Sends one message and reports the outcome.
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> ChannelReport;
}
