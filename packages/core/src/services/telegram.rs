//! Telegram Bot API transport.
//!
//! Implements [`MessageTransport`] over `sendMessage`, `editMessageText` and
//! `deleteMessage`. Every call is a single POST; the Bot API's
//! `{ok, result, error_code, description}` envelope is unpacked here so the
//! notifier only ever sees a [`TransportError`].

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::alerts::transport::{ChatTarget, MessageTransport, ParseMode, TransportError};
use crate::ledger::MessageId;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramClient {
    api_base: String,
    bot_token: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            http: Client::new(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T, TransportError> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await
            // the URL carries the bot token
            .map_err(|err| TransportError::network(format!("{} failed: {}", method, err.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::network(format!("{} body: {}", method, err.without_url())))?;

        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TransportError::rejected(i64::from(status.as_u16()), body));
            }
            Err(err) => {
                return Err(TransportError::format(format!("{}: {}", method, err)));
            }
        };

        if !parsed.ok {
            return Err(TransportError::rejected(
                parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                parsed.description.unwrap_or_default(),
            ));
        }

        parsed
            .result
            .ok_or_else(|| TransportError::format(format!("{}: response has no result", method)))
    }
}

fn base_payload(chat: &ChatTarget, mode: ParseMode) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("chat_id".to_string(), json!(chat.chat_id));
    if let Some(parse_mode) = mode.as_api_str() {
        payload.insert("parse_mode".to_string(), json!(parse_mode));
    }
    payload
}

#[async_trait]
impl MessageTransport for TelegramClient {
    async fn send(
        &self,
        chat: &ChatTarget,
        text: &str,
        mode: ParseMode,
    ) -> Result<MessageId, TransportError> {
        let mut payload = base_payload(chat, mode);
        payload.insert("text".to_string(), json!(text));
        if let Some(thread_id) = chat.thread_id {
            payload.insert("message_thread_id".to_string(), json!(thread_id));
        }

        let sent: SentMessage = self.call("sendMessage", Value::Object(payload)).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn edit(
        &self,
        chat: &ChatTarget,
        id: MessageId,
        text: &str,
        mode: ParseMode,
    ) -> Result<(), TransportError> {
        let mut payload = base_payload(chat, mode);
        payload.insert("message_id".to_string(), json!(id.0));
        payload.insert("text".to_string(), json!(text));

        // result is the edited Message, or `true` for inline messages
        self.call::<Value>("editMessageText", Value::Object(payload))
            .await
            .map(|_| ())
    }

    async fn delete(&self, chat: &ChatTarget, id: MessageId) -> Result<(), TransportError> {
        let payload = json!({
            "chat_id": chat.chat_id,
            "message_id": id.0,
        });

        self.call::<Value>("deleteMessage", payload).await.map(|_| ())
    }
}
