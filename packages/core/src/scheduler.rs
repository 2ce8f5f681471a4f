//! Balance check scheduler.
//!
//! Runs one check cycle at startup and then once per interval: fetch the
//! balance from the provider, hand the reading to the notifier, record the
//! outcome in metrics. Cycles are strictly sequential.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::{self, MissedTickBehavior};

use crate::alerts::{AlertAction, AlertNotifier};
use crate::balance::BalanceSource;
use crate::error::AppError;
use crate::metrics::AppMetrics;

/// Run the check loop until `Ctrl+C` (SIGINT) is received.
///
/// A failed cycle is logged and counted; the loop always carries on to the
/// next tick.
pub async fn run_balance_checks(
    source: Arc<dyn BalanceSource + Send + Sync>,
    notifier: Arc<AlertNotifier>,
    metrics: Arc<AppMetrics>,
    interval: Duration,
) {
    let shutdown = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Could not listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };
    run_checks_until(source, notifier, metrics, interval, shutdown).await;
}

/// Same loop as [`run_balance_checks`], stopping when `shutdown` resolves.
pub async fn run_checks_until<F>(
    source: Arc<dyn BalanceSource + Send + Sync>,
    notifier: Arc<AlertNotifier>,
    metrics: Arc<AppMetrics>,
    interval: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let mut ticker = time::interval(interval);
    // a cycle that outlives its slot should not trigger a burst afterwards
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    tracing::info!(
        provider = source.provider_name(),
        "Balance checks started (interval: {}h)",
        interval.as_secs() / 3600
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // errors are already logged and counted
                let _ = check_once(source.as_ref(), &notifier, &metrics).await;
            }

            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received. Stopping balance checks.");
                break;
            }
        }
    }

    tracing::info!("Balance checks stopped cleanly");
}

/// Execute a single check cycle.
///
/// A source failure aborts the cycle before the notifier runs, so the
/// ledger is left untouched.
pub async fn check_once(
    source: &(dyn BalanceSource + Send + Sync),
    notifier: &AlertNotifier,
    metrics: &AppMetrics,
) -> Result<AlertAction, AppError> {
    metrics.checks_total.inc();
    let provider = source.provider_name();

    let reading = match source.fetch_balance().await {
        Ok(reading) => reading,
        Err(err) => {
            metrics.check_failures_total.inc();
            tracing::error!(provider, "Balance check failed, skipping cycle: {}", err);
            return Err(err.into());
        }
    };

    metrics.last_balance.set(reading.value as f64);
    tracing::info!(
        provider,
        balance = reading.value,
        unit = %reading.unit,
        "Balance fetched"
    );

    match notifier.handle_reading(&reading).await {
        Ok(action) => {
            metrics.record_action(&action);
            Ok(action)
        }
        Err(err) => {
            metrics.check_failures_total.inc();
            tracing::error!(provider, "Alert handling failed: {}", err);
            Err(err.into())
        }
    }
}
