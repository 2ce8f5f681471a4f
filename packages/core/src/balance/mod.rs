//! Balance Sources
//!
//! Abstraction over the vendor-specific login + wallet queries. The check
//! cycle only ever sees a [`BalanceSource`] and the [`BalanceReading`] it
//! returns; authentication details stay behind the trait.

pub mod credentials;
pub mod error;
pub mod source;

pub use credentials::{call_with_credential_retry, TokenAuthenticated};
pub use error::SourceError;
pub use source::{BalanceReading, BalanceSource};
