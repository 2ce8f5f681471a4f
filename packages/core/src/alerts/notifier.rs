//! Alert message lifecycle.
//!
//! Given a fresh [`BalanceReading`], the notifier compares it with the
//! threshold and with the ids recorded in the ledger, then performs exactly
//! one of four actions:
//!
//! | balance     | ledger     | action                                        |
//! |-------------|------------|-----------------------------------------------|
//! | ≥ threshold | empty      | nothing                                       |
//! | ≥ threshold | non-empty  | delete every recorded message, clear entry    |
//! | < threshold | empty      | send a new alert, record its id               |
//! | < threshold | non-empty  | edit the last alert; if that fails, send new  |
//!
//! Only a failed `send` is reported to the caller. Edit failures fall back
//! to sending, delete failures are logged and the sweep carries on.

use std::sync::Arc;

use thiserror::Error;

use crate::alerts::message::{render_low_balance, AlertStyle};
use crate::alerts::transport::{ChatTarget, MessageTransport, ParseMode, TransportError};
use crate::balance::BalanceReading;
use crate::ledger::{LedgerStore, MessageId};

/// What happens to ids whose delete failed during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepPolicy {
    /// Clear the whole entry regardless of delete outcomes.
    #[default]
    DiscardFailed,
    /// Clear the entry, then re-record the ids that could not be deleted so
    /// the next healthy check retries them.
    RetainFailed,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Ledger key, e.g. "arvan".
    pub provider_key: String,
    /// Alerts fire when the balance is strictly below this value.
    pub threshold: i64,
    pub chat: ChatTarget,
    pub parse_mode: ParseMode,
    pub style: AlertStyle,
    pub sweep_policy: SweepPolicy,
}

/// The action taken for one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertAction {
    /// Healthy balance and nothing outstanding.
    None,
    /// Healthy balance; outstanding alerts were swept.
    Cleared {
        deleted: Vec<MessageId>,
        failed: Vec<MessageId>,
    },
    /// Low balance, first alert.
    Sent(MessageId),
    /// Low balance, last alert updated in place.
    Edited(MessageId),
    /// Low balance, editing `stale` failed so `sent` was posted instead.
    Resent { stale: MessageId, sent: MessageId },
}

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Failed to send alert: {0}")]
    Send(#[source] TransportError),
}

pub struct AlertNotifier {
    config: NotifierConfig,
    ledger: Arc<dyn LedgerStore>,
    transport: Arc<dyn MessageTransport + Send + Sync>,
}

impl AlertNotifier {
    pub fn new(
        config: NotifierConfig,
        ledger: Arc<dyn LedgerStore>,
        transport: Arc<dyn MessageTransport + Send + Sync>,
    ) -> Self {
        Self {
            config,
            ledger,
            transport,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// React to a balance reading. See the module docs for the state table.
    pub async fn handle_reading(
        &self,
        reading: &BalanceReading,
    ) -> Result<AlertAction, NotifierError> {
        let provider = self.config.provider_key.as_str();
        let ids = self.ledger.read_ids(provider);

        if reading.value >= self.config.threshold {
            if ids.is_empty() {
                return Ok(AlertAction::None);
            }
            tracing::info!(
                provider,
                balance = reading.value,
                outstanding = ids.len(),
                "Balance recovered, clearing alerts"
            );
            return Ok(self.sweep(ids).await);
        }

        tracing::info!(
            provider,
            balance = reading.value,
            threshold = self.config.threshold,
            "Balance below threshold"
        );
        let text = render_low_balance(&self.config.style, reading, self.config.threshold);

        let Some(&last) = ids.last() else {
            let sent = self.send_new(&text).await?;
            return Ok(AlertAction::Sent(sent));
        };

        match self
            .transport
            .edit(&self.config.chat, last, &text, self.config.parse_mode)
            .await
        {
            Ok(()) => {
                tracing::debug!(provider, message_id = %last, "Alert edited in place");
                Ok(AlertAction::Edited(last))
            }
            Err(err) => {
                tracing::warn!(
                    provider,
                    message_id = %last,
                    "Could not edit alert, sending a new one: {}",
                    err
                );
                let sent = self.send_new(&text).await?;
                Ok(AlertAction::Resent { stale: last, sent })
            }
        }
    }

    async fn send_new(&self, text: &str) -> Result<MessageId, NotifierError> {
        let id = self
            .transport
            .send(&self.config.chat, text, self.config.parse_mode)
            .await
            .map_err(NotifierError::Send)?;

        self.ledger.append(&self.config.provider_key, id);
        tracing::info!(
            provider = %self.config.provider_key,
            message_id = %id,
            "Alert sent"
        );
        Ok(id)
    }

    async fn sweep(&self, ids: Vec<MessageId>) -> AlertAction {
        let provider = self.config.provider_key.as_str();
        let mut deleted = Vec::with_capacity(ids.len());
        let mut failed = Vec::new();

        for id in ids {
            match self.transport.delete(&self.config.chat, id).await {
                Ok(()) => {
                    tracing::info!(provider, message_id = %id, "Deleted alert message");
                    deleted.push(id);
                }
                Err(err) => {
                    tracing::warn!(provider, message_id = %id, "Could not delete message: {}", err);
                    failed.push(id);
                }
            }
        }

        self.ledger.clear(provider);
        if self.config.sweep_policy == SweepPolicy::RetainFailed {
            for id in &failed {
                self.ledger.append(provider, *id);
            }
        }

        AlertAction::Cleared { deleted, failed }
    }
}
