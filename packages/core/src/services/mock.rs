//! In-memory stand-ins for the balance source and the messaging transport.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::alerts::transport::{ChatTarget, MessageTransport, ParseMode, TransportError};
use crate::balance::{BalanceReading, BalanceSource, SourceError};
use crate::ledger::MessageId;

/// Balance source returning a configurable value or error.
pub struct MockBalanceSource {
    result: Mutex<Result<i64, SourceError>>,
    unit: String,
    calls: AtomicUsize,
}

impl MockBalanceSource {
    pub fn new() -> Self {
        Self {
            result: Mutex::new(Ok(0)),
            unit: "IRR".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_balance(self, value: i64) -> Self {
        self.set_balance(value);
        self
    }

    pub fn with_error(self, error: SourceError) -> Self {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Err(error);
        self
    }

    /// Change the balance returned by subsequent calls.
    pub fn set_balance(&self, value: i64) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Ok(value);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockBalanceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceSource for MockBalanceSource {
    async fn fetch_balance(&self) -> Result<BalanceReading, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        result.map(|value| BalanceReading::new(value, self.unit.clone()))
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }
}

/// A transport call as recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Send { text: String },
    Edit { id: MessageId, text: String },
    Delete { id: MessageId },
}

/// Transport that records every call and hands out sequential ids.
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_id: AtomicI64,
    fail_sends: AtomicBool,
    fail_edits: AtomicBool,
    failing_deletes: Mutex<HashSet<MessageId>>,
}

impl MockTransport {
    /// Ids start at 1.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            fail_sends: AtomicBool::new(false),
            fail_edits: AtomicBool::new(false),
            failing_deletes: Mutex::new(HashSet::new()),
        }
    }

    pub fn starting_at(self, first_id: i64) -> Self {
        self.next_id.store(first_id, Ordering::SeqCst);
        self
    }

    pub fn failing_sends(self) -> Self {
        self.fail_sends.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_edits(self) -> Self {
        self.fail_edits.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_delete_of(self, id: MessageId) -> Self {
        self.failing_deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        self
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn send_count(&self) -> usize {
        self.count(|c| matches!(c, TransportCall::Send { .. }))
    }

    pub fn edit_count(&self) -> usize {
        self.count(|c| matches!(c, TransportCall::Edit { .. }))
    }

    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, TransportCall::Delete { .. }))
    }

    fn count(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| pred(c))
            .count()
    }

    fn record(&self, call: TransportCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(
        &self,
        _chat: &ChatTarget,
        text: &str,
        _mode: ParseMode,
    ) -> Result<MessageId, TransportError> {
        self.record(TransportCall::Send {
            text: text.to_string(),
        });
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::network("connection reset"));
        }
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn edit(
        &self,
        _chat: &ChatTarget,
        id: MessageId,
        text: &str,
        _mode: ParseMode,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Edit {
            id,
            text: text.to_string(),
        });
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(TransportError::rejected(
                400,
                "Bad Request: message to edit not found",
            ));
        }
        Ok(())
    }

    async fn delete(&self, _chat: &ChatTarget, id: MessageId) -> Result<(), TransportError> {
        self.record(TransportCall::Delete { id });
        let fails = self
            .failing_deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id);
        if fails {
            return Err(TransportError::rejected(
                400,
                "Bad Request: message can't be deleted",
            ));
        }
        Ok(())
    }
}
