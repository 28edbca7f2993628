use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Header Telegram sets on webhook calls when a secret was registered.
pub const TELEGRAM_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of the current request, available as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Reuses the caller's `x-request-id` or mints a UUID, and echoes it back.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = match req.headers().get(REQUEST_ID_HEADER).map(HeaderValue::to_str) {
        Some(Ok(incoming)) => incoming.to_owned(),
        _ => Uuid::new_v4().to_string(),
    };
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::try_from(id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Expected webhook secret; `None` accepts every caller.
#[derive(Debug, Clone, Default)]
pub struct WebhookSecret(pub Option<String>);

impl WebhookSecret {
    fn allows(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.0.as_deref() else {
            return true;
        };
        headers
            .get(TELEGRAM_SECRET_HEADER)
            .is_some_and(|got| bool::from(got.as_bytes().ct_eq(expected.as_bytes())))
    }
}

#[derive(Debug, Serialize)]
struct RejectionBody {
    error: Rejection,
}

#[derive(Debug, Serialize)]
struct Rejection {
    code: &'static str,
    message: &'static str,
}

/// Middleware rejecting webhook calls that lack the registered secret.
pub async fn require_webhook_secret(
    State(secret): State<WebhookSecret>,
    req: Request,
    next: Next,
) -> Response {
    if secret.allows(req.headers()) {
        return next.run(req).await;
    }

    tracing::warn!("webhook call with missing or wrong secret token");
    (
        StatusCode::UNAUTHORIZED,
        Json(RejectionBody {
            error: Rejection {
                code: "unauthorized",
                message: "missing or invalid secret token",
            },
        }),
    )
        .into_response()
}
