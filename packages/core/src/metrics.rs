//! Prometheus metrics registry for the wallet monitor.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and share it
//! between the check loop and the status server.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`) when a status address is configured.

use prometheus::{Counter, Gauge, Opts, Registry};

use crate::alerts::AlertAction;

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Check cycles started (success + failure).
    pub checks_total: Counter,
    /// Check cycles that ended in an error.
    pub check_failures_total: Counter,
    /// New alert messages posted.
    pub alerts_sent_total: Counter,
    /// Outstanding alerts updated in place.
    pub alerts_edited_total: Counter,
    /// Edits that failed and were replaced by a new message.
    pub edit_fallbacks_total: Counter,
    /// Alert messages deleted after the balance recovered.
    pub alerts_deleted_total: Counter,
    /// Deletes the messaging API refused.
    pub delete_failures_total: Counter,
    /// Last observed balance, in the provider's raw unit.
    pub last_balance: Gauge,
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| -> Result<Counter, prometheus::Error> {
            let counter = Counter::with_opts(Opts::new(format!("wallet_monitor_{}", name), help))?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let checks_total = counter("checks_total", "Balance check cycles started")?;
        let check_failures_total = counter("check_failures_total", "Balance check cycles that failed")?;
        let alerts_sent_total = counter("alerts_sent_total", "Low-balance alerts sent")?;
        let alerts_edited_total = counter("alerts_edited_total", "Low-balance alerts edited in place")?;
        let edit_fallbacks_total = counter(
            "edit_fallbacks_total",
            "Alert edits that failed and fell back to a new message",
        )?;
        let alerts_deleted_total = counter("alerts_deleted_total", "Alert messages deleted on recovery")?;
        let delete_failures_total = counter("delete_failures_total", "Alert deletes that failed")?;

        let last_balance = Gauge::with_opts(Opts::new(
            "wallet_monitor_last_balance",
            "Last observed wallet balance in the provider's raw unit",
        ))?;
        registry.register(Box::new(last_balance.clone()))?;

        Ok(Self {
            checks_total,
            check_failures_total,
            alerts_sent_total,
            alerts_edited_total,
            edit_fallbacks_total,
            alerts_deleted_total,
            delete_failures_total,
            last_balance,
            registry,
        })
    }

    /// Count the messaging side effects of one notifier action.
    pub fn record_action(&self, action: &AlertAction) {
        match action {
            AlertAction::None => {}
            AlertAction::Cleared { deleted, failed } => {
                self.alerts_deleted_total.inc_by(deleted.len() as f64);
                self.delete_failures_total.inc_by(failed.len() as f64);
            }
            AlertAction::Sent(_) => self.alerts_sent_total.inc(),
            AlertAction::Edited(_) => self.alerts_edited_total.inc(),
            AlertAction::Resent { .. } => {
                self.edit_fallbacks_total.inc();
                self.alerts_sent_total.inc();
            }
        }
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
