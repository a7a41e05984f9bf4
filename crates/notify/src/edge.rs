// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Senders that call the hosted `send-email` and `send-whatsapp`
//! functions instead of the providers directly.

use async_trait::async_trait;
use studyq::ChannelReport;
use tracing::{debug, warn};

use crate::error::NotifyError;
use crate::message::{EmailMessage, WhatsAppMessage, plain_text_to_html};
use crate::sender::{EmailSender, WhatsAppSender};
use crate::wire::{EmailFunctionRequest, FunctionResponse, WhatsAppFunctionRequest};

const EMAIL_FUNCTION: &str = "send-email";
const WHATSAPP_FUNCTION: &str = "send-whatsapp";

/// Calls the delivery functions over HTTP.
#[derive(Debug, Clone)]
pub struct EdgeFunctionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EdgeFunctionClient {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client
    /// * `base_url` - Functions host, e.g. `https://project.example.co`
    /// * `api_key` - Bearer key sent with every call
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{name}", self.base_url)
    }

    /// Invokes one function and decodes its response.
    ///
    /// Both success and failure bodies decode; only transport and decoding
    /// problems are errors.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the call fails and `InvalidResponse` if the body
    /// is not a function response.
    pub async fn invoke<T: serde::Serialize + Sync>(
        &self,
        function: &str,
        body: &T,
    ) -> Result<FunctionResponse, NotifyError> {
        let url: String = self.function_url(function);
        debug!(url = %url, "Invoking delivery function");

        let response: reqwest::Response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status: u16 = response.status().as_u16();
        response.json::<FunctionResponse>().await.map_err(|e| {
            NotifyError::InvalidResponse(format!("{function} returned status {status}: {e}"))
        })
    }
}

fn report_from(response: FunctionResponse) -> ChannelReport {
    if response.success {
        ChannelReport::sent(response.message.unwrap_or_default(), response.delivery_id)
    } else {
        ChannelReport::failed(
            response
                .error
                .unwrap_or_else(|| String::from("Delivery function reported failure")),
        )
    }
}

#[async_trait]
impl EmailSender for EdgeFunctionClient {
    async fn send_email(&self, message: &EmailMessage) -> ChannelReport {
        let request: EmailFunctionRequest = EmailFunctionRequest {
            to: message.to.clone(),
            subject: message.subject.clone(),
            html: plain_text_to_html(&message.body),
            material_title: message.attachment.as_ref().map(|a| a.title.clone()),
            material_url: message.attachment.as_ref().map(|a| a.url.clone()),
        };
        match self.invoke(EMAIL_FUNCTION, &request).await {
            Ok(response) => report_from(response),
            Err(e) => {
                warn!(error = %e, to = %message.to, "Email function call failed");
                ChannelReport::failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl WhatsAppSender for EdgeFunctionClient {
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> ChannelReport {
        let request: WhatsAppFunctionRequest = WhatsAppFunctionRequest {
            to: message.to.clone(),
            message: message.body.clone(),
            material_title: None,
            material_url: message.media_url.clone(),
        };
        match self.invoke(WHATSAPP_FUNCTION, &request).await {
            Ok(response) => report_from(response),
            Err(e) => {
                warn!(error = %e, to = %message.to, "WhatsApp function call failed");
                ChannelReport::failed(e.to_string())
            }
        }
    }
}
