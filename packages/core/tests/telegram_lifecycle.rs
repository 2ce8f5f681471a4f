//! End-to-end alert lifecycle against a wiremocked Telegram Bot API.
//!
//! Each test wires the real `TelegramClient` and a `FileLedger` in a temp
//! directory into an `AlertNotifier`, then drives it with readings and
//! inspects both the ledger file and the requests Telegram received.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use wallet_monitor::{
    alerts::{AlertAction, AlertNotifier, ChatTarget, NotifierConfig, ParseMode, SweepPolicy},
    balance::BalanceReading,
    config::ProviderKind,
    ledger::{FileLedger, MessageId},
    services::telegram::TelegramClient,
};

// ---- Helpers ----------------------------------------------------------------

const BOT_TOKEN: &str = "TEST";
const THRESHOLD: i64 = 5_000_000;

fn ok_message(id: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "result": { "message_id": id, "chat": { "id": -1001 }, "date": 0 }
    }))
}

fn ok_true() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true }))
}

fn api_error(description: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "ok": false,
        "error_code": 400,
        "description": description
    }))
}

async fn mount(server: &MockServer, api_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/{}", BOT_TOKEN, api_method)))
        .respond_with(response)
        .mount(server)
        .await;
}

fn build_notifier(server: &MockServer, ledger_path: &Path, policy: SweepPolicy) -> AlertNotifier {
    let config = NotifierConfig {
        provider_key: ProviderKind::Arvan.key().to_string(),
        threshold: THRESHOLD,
        chat: ChatTarget::new("-1001").with_thread(Some(12)),
        parse_mode: ParseMode::Markdown,
        style: ProviderKind::Arvan.alert_style(),
        sweep_policy: policy,
    };
    AlertNotifier::new(
        config,
        Arc::new(FileLedger::new(ledger_path)),
        Arc::new(TelegramClient::new(server.uri(), BOT_TOKEN)),
    )
}

fn ledger_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// (method, body) of every request Telegram received, in order.
async fn received(server: &MockServer) -> Vec<(String, Value)> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|req| {
            let api_method = req.url.path().rsplit('/').next().unwrap().to_string();
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            (api_method, body)
        })
        .collect()
}

// ---- Tests ------------------------------------------------------------------

#[tokio::test]
async fn low_then_low_then_recovered() {
    let server = MockServer::start().await;
    mount(&server, "sendMessage", ok_message(42)).await;
    mount(&server, "editMessageText", ok_message(42)).await;
    mount(&server, "deleteMessage", ok_true()).await;

    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("sent-messages.json");
    let notifier = build_notifier(&server, &ledger_path, SweepPolicy::DiscardFailed);

    let first = notifier
        .handle_reading(&BalanceReading::new(1_200_000, "IRR"))
        .await
        .unwrap();
    assert_eq!(first, AlertAction::Sent(MessageId(42)));
    assert_eq!(ledger_json(&ledger_path), json!({ "arvan": { "ids": [42] } }));

    let second = notifier
        .handle_reading(&BalanceReading::new(900_000, "IRR"))
        .await
        .unwrap();
    assert_eq!(second, AlertAction::Edited(MessageId(42)));
    assert_eq!(ledger_json(&ledger_path), json!({ "arvan": { "ids": [42] } }));

    let third = notifier
        .handle_reading(&BalanceReading::new(8_000_000, "IRR"))
        .await
        .unwrap();
    assert_eq!(
        third,
        AlertAction::Cleared {
            deleted: vec![MessageId(42)],
            failed: vec![]
        }
    );
    assert_eq!(ledger_json(&ledger_path), json!({}));

    let requests = received(&server).await;
    let methods: Vec<&str> = requests.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(methods, ["sendMessage", "editMessageText", "deleteMessage"]);

    let (_, send) = &requests[0];
    assert_eq!(send["chat_id"], "-1001");
    assert_eq!(send["message_thread_id"], 12);
    assert_eq!(send["parse_mode"], "Markdown");
    let text = send["text"].as_str().unwrap();
    assert!(text.starts_with("*⚠️ Arvan Wallet Low Balance*"));
    assert!(text.contains("Threshold: 500,000 T"));
    assert!(text.contains("Current Balance: 120,000 T"));

    let (_, edit) = &requests[1];
    assert_eq!(edit["message_id"], 42);
    assert!(edit["text"].as_str().unwrap().contains("Current Balance: 90,000 T"));

    let (_, delete) = &requests[2];
    assert_eq!(delete, &json!({ "chat_id": "-1001", "message_id": 42 }));
}

#[tokio::test]
async fn healthy_balance_with_empty_ledger_sends_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("sent-messages.json");
    let notifier = build_notifier(&server, &ledger_path, SweepPolicy::DiscardFailed);

    let action = notifier
        .handle_reading(&BalanceReading::new(THRESHOLD, "IRR"))
        .await
        .unwrap();

    assert_eq!(action, AlertAction::None);
    assert!(received(&server).await.is_empty());
    assert!(!ledger_path.exists());
}

#[tokio::test]
async fn failed_edit_falls_back_to_new_message() {
    let server = MockServer::start().await;
    mount(&server, "editMessageText", api_error("Bad Request: message to edit not found")).await;
    mount(&server, "sendMessage", ok_message(43)).await;

    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("sent-messages.json");
    std::fs::write(&ledger_path, r#"{"arvan":{"ids":[42]}}"#).unwrap();
    let notifier = build_notifier(&server, &ledger_path, SweepPolicy::DiscardFailed);

    let action = notifier
        .handle_reading(&BalanceReading::new(100, "IRR"))
        .await
        .unwrap();

    assert_eq!(
        action,
        AlertAction::Resent {
            stale: MessageId(42),
            sent: MessageId(43)
        }
    );
    assert_eq!(ledger_json(&ledger_path), json!({ "arvan": { "ids": [42, 43] } }));
}

#[tokio::test]
async fn send_rejection_is_reported_and_ledger_untouched() {
    let server = MockServer::start().await;
    mount(&server, "sendMessage", api_error("Bad Request: chat not found")).await;

    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("sent-messages.json");
    let notifier = build_notifier(&server, &ledger_path, SweepPolicy::DiscardFailed);

    let err = notifier
        .handle_reading(&BalanceReading::new(100, "IRR"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("chat not found"));
    assert!(!ledger_path.exists());
}

#[tokio::test]
async fn sweep_keeps_other_providers_and_honours_retain_policy() {
    let server = MockServer::start().await;
    // registered first, so it wins over the catch-all below
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/deleteMessage", BOT_TOKEN)))
        .and(wiremock::matchers::body_string_contains("\"message_id\":8"))
        .respond_with(api_error("Bad Request: message can't be deleted"))
        .mount(&server)
        .await;
    mount(&server, "deleteMessage", ok_true()).await;

    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("sent-messages.json");
    std::fs::write(
        &ledger_path,
        r#"{"arvan":{"ids":[7,8,9]},"hamravesh":{"ids":[100]}}"#,
    )
    .unwrap();
    let notifier = build_notifier(&server, &ledger_path, SweepPolicy::RetainFailed);

    let action = notifier
        .handle_reading(&BalanceReading::new(THRESHOLD + 1, "IRR"))
        .await
        .unwrap();

    assert_eq!(
        action,
        AlertAction::Cleared {
            deleted: vec![MessageId(7), MessageId(9)],
            failed: vec![MessageId(8)]
        }
    );
    assert_eq!(
        ledger_json(&ledger_path),
        json!({ "arvan": { "ids": [8] }, "hamravesh": { "ids": [100] } })
    );
}

#[tokio::test]
async fn corrupt_ledger_is_treated_as_empty() {
    let server = MockServer::start().await;
    mount(&server, "sendMessage", ok_message(5)).await;

    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("sent-messages.json");
    std::fs::write(&ledger_path, "{ not json").unwrap();
    let notifier = build_notifier(&server, &ledger_path, SweepPolicy::DiscardFailed);

    let action = notifier
        .handle_reading(&BalanceReading::new(1, "IRR"))
        .await
        .unwrap();

    assert_eq!(action, AlertAction::Sent(MessageId(5)));
    assert_eq!(ledger_json(&ledger_path), json!({ "arvan": { "ids": [5] } }));
}
