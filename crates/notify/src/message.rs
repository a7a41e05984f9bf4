// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

/// A reference to downloadable material carried alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Material title, used as the attachment name.
    pub title: String,
    /// Download link.
    pub url: String,
}

/// An outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Optional material reference.
    pub attachment: Option<Attachment>,
}

/// An outbound WhatsApp message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppMessage {
    /// Recipient number, with or without the `whatsapp:` prefix.
    pub to: String,
    /// Message text.
    pub body: String,
    /// Optional media link.
    pub media_url: Option<String>,
}

/// Wraps a plain-text body in minimal HTML, escaping markup and keeping
/// line breaks.
#[must_use]
pub fn plain_text_to_html(body: &str) -> String {
    let escaped: String =
        html_escape::encode_double_quoted_attribute(body).replace('\n', "<br>\n");
    format!("<div style=\"font-family: sans-serif; line-height: 1.5\">{escaped}</div>")
}

/// Builds a synthetic delivery id such as `EMAIL_1767225600000`.
#[must_use]
pub fn synthetic_delivery_id(prefix: &str) -> String {
    let millis: i128 = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{prefix}_{millis}")
}
