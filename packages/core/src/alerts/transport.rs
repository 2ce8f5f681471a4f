//! Messaging transport interface
//!
//! The notifier talks to the chat through this trait only. The production
//! implementation is [`TelegramClient`](crate::services::telegram::TelegramClient).

use async_trait::async_trait;
use thiserror::Error;

use crate::ledger::MessageId;

/// Where alerts are posted: a chat, optionally a forum topic inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTarget {
    pub chat_id: String,
    pub thread_id: Option<i64>,
}

impl ChatTarget {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            thread_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: Option<i64>) -> Self {
        self.thread_id = thread_id;
        self
    }
}

/// Text formatting the transport should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Markdown,
    Html,
    Plain,
}

impl ParseMode {
    /// Value of the Bot API `parse_mode` field; `None` for plain text.
    pub fn as_api_str(self) -> Option<&'static str> {
        match self {
            ParseMode::Markdown => Some("Markdown"),
            ParseMode::Html => Some("HTML"),
            ParseMode::Plain => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {message}")]
    Network { message: String },

    /// The API answered but refused the request (unknown message,
    /// unchanged text, missing rights, ...).
    #[error("API rejected request ({code}): {description}")]
    Rejected { code: i64, description: String },

    #[error("Malformed API response: {message}")]
    Format { message: String },
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn rejected(code: i64, description: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            description: description.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format { message: message.into() }
    }
}

#[async_trait]
pub trait MessageTransport {
    /// Post a new message and return its id.
    async fn send(
        &self,
        chat: &ChatTarget,
        text: &str,
        mode: ParseMode,
    ) -> Result<MessageId, TransportError>;

    /// Replace the text of an existing message.
    async fn edit(
        &self,
        chat: &ChatTarget,
        id: MessageId,
        text: &str,
        mode: ParseMode,
    ) -> Result<(), TransportError>;

    async fn delete(&self, chat: &ChatTarget, id: MessageId) -> Result<(), TransportError>;
}
