// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Outbound email and WhatsApp delivery.
//!
//! Three sender families implement `EmailSender` and `WhatsAppSender`:
//! provider clients (SendGrid, Twilio), the hosted delivery functions, and
//! a tracing-only sender for local use.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod config;
mod edge;
mod error;
mod message;
mod sender;
mod sendgrid;
mod tracing_sender;
mod twilio;
mod wire;

#[cfg(test)]
mod tests;

pub use config::{
    DEFAULT_FROM_EMAIL, DEFAULT_FROM_NAME, DEFAULT_WHATSAPP_FROM, SendGridConfig, TwilioConfig,
    build_http_client,
};
pub use edge::EdgeFunctionClient;
pub use error::NotifyError;
pub use message::{
    Attachment, EmailMessage, WhatsAppMessage, plain_text_to_html, synthetic_delivery_id,
};
pub use sender::{EmailSender, WhatsAppSender};
pub use sendgrid::SendGridClient;
pub use tracing_sender::TracingSender;
pub use twilio::{TwilioClient, normalize_whatsapp_address};
pub use wire::{EmailFunctionRequest, FunctionResponse, WhatsAppFunctionRequest};
