//! Error types for balance sources

use thiserror::Error;

/// Errors surfaced by a [`BalanceSource`](super::BalanceSource).
///
/// Any of these aborts the current check cycle; the ledger is never touched
/// when the balance could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Data format error: {message}")]
    Format { message: String },
}

impl SourceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format { message: message.into() }
    }
}
