use thiserror::Error;

use crate::alerts::NotifierError;
use crate::balance::SourceError;
use crate::config::ConfigError;

/// Unified application error.
///
/// Everything that can end a check cycle or stop startup funnels into this
/// type; ledger problems never do.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Balance check failed: {0}")]
    Source(#[from] SourceError),

    #[error("Notification failed: {0}")]
    Notify(#[from] NotifierError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
