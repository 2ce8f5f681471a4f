use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;

use wallet_monitor::alerts::AlertNotifier;
use wallet_monitor::api::serve_status;
use wallet_monitor::cli::Cli;
use wallet_monitor::config::{Config, ProviderKind};
use wallet_monitor::error::AppError;
use wallet_monitor::ledger::FileLedger;
use wallet_monitor::logging::init_logging;
use wallet_monitor::metrics::AppMetrics;
use wallet_monitor::scheduler::run_balance_checks;
use wallet_monitor::services::{balance_source_for, telegram::TelegramClient};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    if let Err(err) = run(cli.provider.into()).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(provider: ProviderKind) -> Result<(), AppError> {
    let config = Config::from_env(provider)?;
    tracing::info!("Service started with config: {:?}", config);

    let metrics = Arc::new(AppMetrics::new()?);
    if let Some(addr) = config.status_addr {
        serve_status(addr, metrics.clone()).await?;
    }

    let source = balance_source_for(&config);
    let transport = Arc::new(TelegramClient::new(
        config.telegram.api_url.clone(),
        config.telegram.bot_token.clone(),
    ));
    let ledger = Arc::new(FileLedger::new(config.ledger_path.clone()));
    let notifier = Arc::new(AlertNotifier::new(
        config.notifier_config(),
        ledger,
        transport,
    ));

    run_balance_checks(source, notifier, metrics, config.check_interval()).await;
    Ok(())
}
