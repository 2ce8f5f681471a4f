use clap::{Parser, Subcommand};

use crate::config::ProviderKind;

/// Wallet balance monitor CLI.
///
/// All settings come from the environment (or a `.env` file); the
/// subcommand only picks the vendor.
#[derive(Debug, Parser)]
#[command(
    name = "wallet-monitor",
    version,
    about = "Watches a prepaid cloud wallet and keeps one low-balance alert in Telegram"
)]
pub struct Cli {
    #[command(subcommand)]
    pub provider: ProviderCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ProviderCommand {
    /// Monitor an Arvan Cloud wallet (ARVAN_* variables)
    Arvan,
    /// Monitor a Hamravesh wallet (HAMRAVESH_* variables)
    Hamravesh,
}

impl From<ProviderCommand> for ProviderKind {
    fn from(command: ProviderCommand) -> Self {
        match command {
            ProviderCommand::Arvan => ProviderKind::Arvan,
            ProviderCommand::Hamravesh => ProviderKind::Hamravesh,
        }
    }
}
