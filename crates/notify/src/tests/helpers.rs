// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;

use crate::build_http_client;

/// A request captured by a stub provider.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub authorization: Option<String>,
    pub json: Option<serde_json::Value>,
    pub form: Option<HashMap<String, String>>,
}

#[derive(Clone)]
pub struct StubState {
    pub status: StatusCode,
    pub captured: Arc<Mutex<Vec<Captured>>>,
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn json_handler(
    State(state): State<StubState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<serde_json::Value>,
) -> impl IntoResponse {
    state.captured.lock().unwrap().push(Captured {
        authorization: authorization(&headers),
        json: Some(body),
        form: None,
    });
    (state.status, [("x-message-id", "sg-message-1")], "")
}

async fn form_handler(
    State(state): State<StubState>,
    headers: HeaderMap,
    axum::Form(body): axum::Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.captured.lock().unwrap().push(Captured {
        authorization: authorization(&headers),
        json: None,
        form: Some(body),
    });
    (
        state.status,
        axum::Json(serde_json::json!({ "sid": "SM123", "status": "queued" })),
    )
}

async fn function_handler(
    State(state): State<StubState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<serde_json::Value>,
) -> impl IntoResponse {
    state.captured.lock().unwrap().push(Captured {
        authorization: authorization(&headers),
        json: Some(body),
        form: None,
    });
    let reply: serde_json::Value = if state.status.is_success() {
        serde_json::json!({ "success": true, "message": "sent", "deliveryId": "EDGE_1" })
    } else {
        serde_json::json!({ "success": false, "error": "provider down" })
    };
    (state.status, axum::Json(reply))
}

/// Starts a stub provider on an ephemeral port and returns its base URL.
pub async fn spawn_stub(status: StatusCode) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured: Arc<Mutex<Vec<Captured>>> = Arc::new(Mutex::new(Vec::new()));
    let state: StubState = StubState {
        status,
        captured: Arc::clone(&captured),
    };
    let app: Router = Router::new()
        .route("/v3/mail/send", post(json_handler))
        .route(
            "/2010-04-01/Accounts/{sid}/Messages.json",
            post(form_handler),
        )
        .route("/functions/v1/{name}", post(function_handler))
        .with_state(state);

    let listener: tokio::net::TcpListener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr: std::net::SocketAddr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    (format!("http://{addr}"), captured)
}

pub fn http_client() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).expect("http client")
}
