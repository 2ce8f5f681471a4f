use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::SourceError;

/// A single wallet balance observation.
///
/// `value` is in the provider's raw unit (the same unit the threshold is
/// configured in). Readings are produced fresh on every check and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReading {
    pub value: i64,
    pub unit: String,
    pub observed_at: DateTime<Utc>,
}

impl BalanceReading {
    /// Reading stamped with the current time.
    pub fn new(value: i64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
            observed_at: Utc::now(),
        }
    }
}

/// Trait for wallet balance providers.
#[async_trait]
pub trait BalanceSource {
    /// Authenticate as needed and return the current wallet balance.
    async fn fetch_balance(&self) -> Result<BalanceReading, SourceError>;

    /// Provider name for logging.
    fn provider_name(&self) -> &str;
}
