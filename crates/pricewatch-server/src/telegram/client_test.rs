use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::telegram::InlineKeyboardButton;

const TOKEN: &str = "123:test-token";

fn client(server: &MockServer) -> TelegramClient {
    TelegramClient::new(&server.uri(), TOKEN, 5).expect("client builds")
}

fn sent_message(chat_id: i64) -> serde_json::Value {
    json!({
        "ok": true,
        "result": { "message_id": 10, "chat": { "id": chat_id }, "text": "hi" }
    })
}

#[tokio::test]
async fn send_message_posts_html_with_link_preview() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({
            "chat_id": 42,
            "text": "<b>hi</b>",
            "parse_mode": "HTML",
            "link_preview_options": { "is_disabled": false }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(42)))
        .expect(1)
        .mount(&server)
        .await;

    let message = client(&server)
        .send_message(42, "<b>hi</b>", None)
        .await
        .expect("send succeeds");
    assert_eq!(message.chat.id, 42);
}

#[tokio::test]
async fn send_message_includes_inline_keyboard() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({
            "reply_markup": {
                "inline_keyboard": [[{ "text": "Ноутбуки", "callback_data": "cat_3192" }]]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(7)))
        .expect(1)
        .mount(&server)
        .await;

    let keyboard = InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: "Ноутбуки".to_string(),
            callback_data: "cat_3192".to_string(),
        }]],
    };
    client(&server)
        .send_message(7, "pick", Some(&keyboard))
        .await
        .expect("send succeeds");
}

#[tokio::test]
async fn blocked_user_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;

    let err = client(&server).send(42, "hi").await.unwrap_err();
    match err {
        NotifyError::Api {
            method,
            code,
            description,
        } => {
            assert_eq!(method, "sendMessage");
            assert_eq!(code, Some(403));
            assert!(description.contains("blocked"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_errors_do_not_leak_the_token() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let client = TelegramClient::new(&format!("http://{addr}"), TOKEN, 2).expect("client");

    let err = client.send(1, "hi").await.unwrap_err();
    assert!(matches!(err, NotifyError::Http(_)));
    assert!(!err.to_string().contains("test-token"));
}

#[tokio::test]
async fn get_updates_sends_offset_and_parses_updates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({ "offset": 101, "timeout": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                {
                    "update_id": 101,
                    "message": {
                        "message_id": 1,
                        "chat": { "id": 42 },
                        "from": { "id": 42 },
                        "text": "/start"
                    }
                },
                {
                    "update_id": 102,
                    "callback_query": {
                        "id": "cb-1",
                        "from": { "id": 42 },
                        "data": "cat_3192"
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let updates = client(&server)
        .get_updates(Some(101), 0)
        .await
        .expect("updates");
    assert_eq!(updates.len(), 2);
    assert_eq!(
        updates[0].message.as_ref().and_then(|m| m.text.as_deref()),
        Some("/start")
    );
    assert_eq!(
        updates[1]
            .callback_query
            .as_ref()
            .and_then(|c| c.data.as_deref()),
        Some("cat_3192")
    );
}

#[tokio::test]
async fn set_webhook_passes_secret_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/setWebhook")))
        .and(body_partial_json(json!({
            "url": "https://bot.example.com/telegram/webhook",
            "secret_token": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .set_webhook("https://bot.example.com/telegram/webhook", Some("s3cret"))
        .await
        .expect("webhook set");
}
