//! Webhook gateway.
//!
//! Telegram POSTs one `Update` per request. Once an update is decoded the
//! response is always 200: failures inside the router are logged, never
//! surfaced, so Telegram does not redeliver.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json,
};
use serde::Serialize;
use teloxide::{prelude::*, types::AllowedUpdate};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use relay_core::config::WebhookConfig;

use crate::{inbound, AppState};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
}

struct WebhookState {
    app: Arc<AppState>,
    secret: String,
}

/// Router with the update endpoint mounted at `path`. Every request must carry
/// `secret` in the secret-token header.
pub fn webhook_router(path: &str, app: Arc<AppState>, secret: String) -> axum::Router {
    axum::Router::new()
        .route(path, post(handle_update))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(WebhookState { app, secret }))
}

async fn handle_update(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, StatusCode> {
    let provided = headers
        .get(SECRET_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if !constant_time_eq(provided, state.secret.as_bytes()) {
        warn!("webhook request with missing or wrong secret token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "failed to decode webhook update");
        StatusCode::BAD_REQUEST
    })?;

    match inbound::from_update(&update) {
        Some(event) => state.app.deliver(event).await,
        None => debug!(update_id = ?update.id, "ignoring unsupported update"),
    }

    Ok(Json(Ack { status: "received" }))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Register the webhook with Telegram and serve updates until Ctrl-C.
pub async fn run_webhook(bot: Bot, app: Arc<AppState>, cfg: &WebhookConfig) -> anyhow::Result<()> {
    let url = reqwest::Url::parse(&cfg.endpoint_url())?;
    bot.set_webhook(url)
        .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
        .secret_token(cfg.secret.clone())
        .await?;

    let router = webhook_router(&cfg.path, app, cfg.secret.clone());
    let listener = tokio::net::TcpListener::bind(&cfg.listen_address).await?;
    info!(
        address = %cfg.listen_address,
        path = %cfg.path,
        "webhook server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    Ok(())
}
