// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The `send-email` and `send-whatsapp` delivery functions.
//!
//! Clients built on `EdgeFunctionClient` post here; the functions relay to
//! SendGrid and Twilio with the server's credentials. Both answer CORS
//! preflight requests for browser callers.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, Method, StatusCode, header},
    routing::post,
};
use std::sync::Arc;
use studyq_notify::{
    Attachment, EmailFunctionRequest, FunctionResponse, SendGridClient, TwilioClient,
    WhatsAppFunctionRequest,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Title used for an attached link when the caller gives none.
const DEFAULT_ATTACHMENT_TITLE: &str = "Study material";

/// Provider clients used by the functions.
#[derive(Debug, Clone)]
pub struct EdgeProviders {
    /// SendGrid client for `send-email`.
    pub email: SendGridClient,
    /// Twilio client for `send-whatsapp`.
    pub whatsapp: TwilioClient,
}

type FunctionResult = (StatusCode, Json<FunctionResponse>);

fn failure(status: StatusCode, message: String) -> FunctionResult {
    (status, Json(FunctionResponse::failed(message)))
}

/// Handler for POST `/functions/v1/send-email`.
async fn handle_send_email(
    State(providers): State<Arc<EdgeProviders>>,
    body: Result<Json<EmailFunctionRequest>, JsonRejection>,
) -> FunctionResult {
    let request: EmailFunctionRequest = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if !request.has_required_fields() {
        return failure(
            StatusCode::BAD_REQUEST,
            String::from("Missing required fields: to, subject, html"),
        );
    }

    let attachment: Option<Attachment> = request.material_url.clone().map(|url| Attachment {
        title: request
            .material_title
            .clone()
            .unwrap_or_else(|| String::from(DEFAULT_ATTACHMENT_TITLE)),
        url,
    });

    match providers
        .email
        .send_html(
            &request.to,
            &request.subject,
            &request.html,
            attachment.as_ref(),
        )
        .await
    {
        Ok(delivery_id) => {
            info!(to = %request.to, delivery_id = %delivery_id, "send-email succeeded");
            (
                StatusCode::OK,
                Json(FunctionResponse::sent(
                    format!("Email sent successfully to {}", request.to),
                    delivery_id,
                )),
            )
        }
        Err(e) => {
            error!(error = %e, to = %request.to, "send-email failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Handler for POST `/functions/v1/send-whatsapp`.
async fn handle_send_whatsapp(
    State(providers): State<Arc<EdgeProviders>>,
    body: Result<Json<WhatsAppFunctionRequest>, JsonRejection>,
) -> FunctionResult {
    let request: WhatsAppFunctionRequest = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if !request.has_required_fields() {
        return failure(
            StatusCode::BAD_REQUEST,
            String::from("Missing required fields: to, message"),
        );
    }

    match providers
        .whatsapp
        .send_message(
            &request.to,
            &request.message,
            request.material_url.as_deref(),
        )
        .await
    {
        Ok(delivery_id) => {
            info!(to = %request.to, delivery_id = %delivery_id, "send-whatsapp succeeded");
            (
                StatusCode::OK,
                Json(FunctionResponse::sent(
                    format!("WhatsApp message sent successfully to {}", request.to),
                    delivery_id,
                )),
            )
        }
        Err(e) => {
            error!(error = %e, to = %request.to, "send-whatsapp failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Builds the functions router with permissive CORS.
pub fn router(providers: Arc<EdgeProviders>) -> Router {
    let cors: CorsLayer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/functions/v1/send-email", post(handle_send_email))
        .route("/functions/v1/send-whatsapp", post(handle_send_whatsapp))
        .layer(cors)
        .with_state(providers)
}
