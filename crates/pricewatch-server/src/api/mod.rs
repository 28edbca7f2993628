use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{request_id, require_webhook_secret, RequestId, WebhookSecret};
use crate::telegram::Update;

pub const WEBHOOK_PATH: &str = "/telegram/webhook";

/// Everything the webhook route needs to accept an update.
#[derive(Clone)]
pub struct WebhookState {
    /// Feeds the single update worker, see [`crate::dialog::spawn_update_worker`].
    pub updates: mpsc::Sender<Update>,
    pub secret: WebhookSecret,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

/// Health endpoint always; the webhook route only in webhook mode.
pub fn build_app(webhook: Option<WebhookState>) -> Router {
    let mut app = Router::new().route("/health", get(health));

    if let Some(webhook) = webhook {
        let webhook_routes = Router::new()
            .route(WEBHOOK_PATH, post(telegram_webhook))
            .layer(axum::middleware::from_fn_with_state(
                webhook.secret.clone(),
                require_webhook_secret,
            ))
            .with_state(webhook);
        app = app.merge(webhook_routes);
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(request_id)),
    )
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthData { status: "ok" }))
}

/// Queues the update and acknowledges it at once, so a slow marketplace
/// check never makes Telegram redeliver. A stopped worker answers 503 and
/// Telegram retries later.
async fn telegram_webhook(
    State(state): State<WebhookState>,
    Extension(req_id): Extension<RequestId>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(request_id = %req_id.0, update_id = update.update_id, "webhook update");
    match state.updates.send(update).await {
        Ok(()) => StatusCode::OK,
        Err(_) => {
            tracing::error!(request_id = %req_id.0, "webhook update worker is gone");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
