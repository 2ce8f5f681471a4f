//! Message ledger.
//!
//! Durable record of the alert messages still visible in the chat, one
//! entry per provider:
//!
//! ```json
//! { "hamravesh": { "ids": [812, 815] }, "arvan": { "ids": [40] } }
//! ```
//!
//! Ids are kept in the order they were sent, so the last one is the message
//! eligible for edit-in-place. Every mutation is a full read-modify-write of
//! the backing file; there is no locking, so the last writer wins.
//!
//! Storage problems never reach the caller. A missing, unreadable or
//! malformed file reads as an empty ledger, a malformed provider entry reads
//! as an empty sequence without touching the others, and failed writes are
//! logged as warnings.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::persist::{read_json, write_json_atomic};

/// Identifier of a message returned by the messaging transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage seam for the notifier. Implementations swallow their own
/// failures; see the module docs.
pub trait LedgerStore: Send + Sync {
    /// Append `id` to the end of the provider's sequence, creating the entry
    /// if needed.
    fn append(&self, provider: &str, id: MessageId);

    /// Ids recorded for `provider`, oldest first. Empty when there is no
    /// entry or the store cannot be read.
    fn read_ids(&self, provider: &str) -> Vec<MessageId>;

    /// Remove the provider's entry entirely.
    fn clear(&self, provider: &str);
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("could not read ledger {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("could not write ledger {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerEntry {
    #[serde(default)]
    ids: Vec<MessageId>,
}

type LedgerMap = BTreeMap<String, LedgerEntry>;

/// On-disk form. Entries are decoded one provider at a time so a malformed
/// entry never takes the other providers' ids down with it.
type RawLedger = BTreeMap<String, Value>;

/// JSON-file ledger.
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RawLedger, LedgerError> {
        read_json::<RawLedger>(&self.path)
            .map(Option::unwrap_or_default)
            .map_err(|source| LedgerError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn load_or_empty(&self) -> RawLedger {
        self.load().unwrap_or_else(|err| {
            tracing::warn!("{}; treating ledger as empty", err);
            RawLedger::new()
        })
    }

    /// Decode one provider's entry. A missing entry is empty; a malformed
    /// one is logged and reset.
    fn entry(&self, raw: &RawLedger, provider: &str) -> LedgerEntry {
        let Some(value) = raw.get(provider) else {
            return LedgerEntry::default();
        };
        serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            tracing::warn!(
                provider,
                "Malformed entry in ledger {}: {}; resetting it",
                self.path.display(),
                err
            );
            LedgerEntry::default()
        })
    }

    fn save(&self, raw: &RawLedger) {
        if let Err(source) = write_json_atomic(&self.path, raw) {
            let err = LedgerError::Write {
                path: self.path.clone(),
                source,
            };
            tracing::warn!("{}", err);
        }
    }
}

impl LedgerStore for FileLedger {
    fn append(&self, provider: &str, id: MessageId) {
        let mut raw = self.load_or_empty();
        let mut entry = self.entry(&raw, provider);
        entry.ids.push(id);
        raw.insert(provider.to_string(), json!(entry));
        self.save(&raw);
    }

    fn read_ids(&self, provider: &str) -> Vec<MessageId> {
        self.entry(&self.load_or_empty(), provider).ids
    }

    fn clear(&self, provider: &str) {
        let mut raw = self.load_or_empty();
        raw.remove(provider);
        self.save(&raw);
    }
}

/// In-process ledger, for tests and for running without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<LedgerMap>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a provider's entry.
    pub fn with_ids(self, provider: &str, ids: impl IntoIterator<Item = i64>) -> Self {
        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.insert(
                provider.to_string(),
                LedgerEntry {
                    ids: ids.into_iter().map(MessageId).collect(),
                },
            );
        }
        self
    }

    /// `true` when the provider has an entry, even an empty one.
    pub fn has_entry(&self, provider: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(provider)
    }
}

impl LedgerStore for MemoryLedger {
    fn append(&self, provider: &str, id: MessageId) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(provider.to_string())
            .or_default()
            .ids
            .push(id);
    }

    fn read_ids(&self, provider: &str) -> Vec<MessageId> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .map(|entry| entry.ids.clone())
            .unwrap_or_default()
    }

    fn clear(&self, provider: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(provider);
    }
}
