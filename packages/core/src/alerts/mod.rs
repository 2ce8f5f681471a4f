//! Low-balance alerting: message rendering, the transport seam, and the
//! notifier that keeps one outstanding alert per provider.

pub mod message;
pub mod notifier;
pub mod transport;

pub use message::{format_grouped, render_low_balance, AlertStyle};
pub use notifier::{AlertAction, AlertNotifier, NotifierConfig, NotifierError, SweepPolicy};
pub use transport::{ChatTarget, MessageTransport, ParseMode, TransportError};
