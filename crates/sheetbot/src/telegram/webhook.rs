//! Webhook HTTP server
//!
//! Telegram redelivers updates that are not answered with 2xx, so every
//! authenticated update gets 200 once it has been handled or logged.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::BotApp;
use crate::update::InboundUpdate;

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct WebhookState {
    pub app: BotApp,
    pub secret: Option<String>,
}

pub fn create_webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(handle_webhook))
        .with_state(Arc::new(state))
}

/// Serves the webhook until the listener fails.
pub async fn run_webhook_server(addr: &str, state: WebhookState) -> anyhow::Result<()> {
    let router = create_webhook_router(state);
    log::info!("Starting webhook server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sheetbot"
    }))
}

fn secret_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

async fn handle_webhook(State(state): State<Arc<WebhookState>>, headers: HeaderMap, body: Bytes) -> StatusCode {
    if !secret_matches(state.secret.as_deref(), &headers) {
        log::warn!("Rejected webhook call with a missing or wrong secret token");
        return StatusCode::UNAUTHORIZED;
    }

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Ignoring webhook body that is not JSON: {}", e);
            return StatusCode::OK;
        }
    };

    match InboundUpdate::from_json(&value) {
        Some(update) => state.app.process(update).await,
        None => log::warn!(
            "Ignoring unsupported update {}",
            value.get("update_id").cloned().unwrap_or_default()
        ),
    }
    StatusCode::OK
}
