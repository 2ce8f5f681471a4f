use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::alerts::{AlertStyle, ChatTarget, NotifierConfig, ParseMode, SweepPolicy};
use crate::services::arvan::{DEFAULT_ARVAN_API_URL, DEFAULT_ARVAN_AUTH_URL};
use crate::services::hamravesh::DEFAULT_HAMRAVESH_API_URL;
use crate::services::telegram::DEFAULT_TELEGRAM_API_URL;

const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 6;
/// One year.
const MAX_CHECK_INTERVAL_HOURS: u64 = 24 * 365;
const DEFAULT_LEDGER_PATH: &str = "./sent-messages.json";
const DEFAULT_TOKEN_CACHE_PATH: &str = "./token-cache.json";

/// The wallet vendor a process monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Arvan,
    Hamravesh,
}

impl ProviderKind {
    /// Ledger key.
    pub fn key(self) -> &'static str {
        match self {
            ProviderKind::Arvan => "arvan",
            ProviderKind::Hamravesh => "hamravesh",
        }
    }

    pub fn env_prefix(self) -> &'static str {
        match self {
            ProviderKind::Arvan => "ARVAN_",
            ProviderKind::Hamravesh => "HAMRAVESH_",
        }
    }

    /// Arvan balances are shown in Toman (Rial / 10), Hamravesh in Rial.
    pub fn alert_style(self) -> AlertStyle {
        match self {
            ProviderKind::Arvan => AlertStyle {
                marker: "⚠️".to_string(),
                title: "Arvan".to_string(),
                display_unit: "T".to_string(),
                display_decimals: 1,
            },
            ProviderKind::Hamravesh => AlertStyle {
                marker: "⚠️🟪".to_string(),
                title: "Hamravesh".to_string(),
                display_unit: "IRR".to_string(),
                display_decimals: 0,
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(String),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: String, reason: String },
}

impl ConfigError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub topic_id: Option<i64>,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("topic_id", &self.topic_id)
            .finish()
    }
}

/// Vendor-specific settings.
#[derive(Clone)]
pub enum ProviderSettings {
    Arvan {
        auth_url: String,
        api_url: String,
    },
    Hamravesh {
        api_url: String,
        cookie: Option<String>,
        token_cache_path: PathBuf,
    },
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSettings::Arvan { auth_url, api_url } => f
                .debug_struct("Arvan")
                .field("auth_url", auth_url)
                .field("api_url", api_url)
                .finish(),
            ProviderSettings::Hamravesh {
                api_url,
                cookie,
                token_cache_path,
            } => f
                .debug_struct("Hamravesh")
                .field("api_url", api_url)
                .field("cookie", &cookie.as_ref().map(|_| "<redacted>"))
                .field("token_cache_path", token_cache_path)
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub email: String,
    pub password: String,
    /// In the provider's raw unit (IRR for both vendors).
    pub threshold: i64,
    pub telegram: TelegramSettings,
    pub check_interval_hours: u64,
    pub ledger_path: PathBuf,
    pub sweep_policy: SweepPolicy,
    pub status_addr: Option<SocketAddr>,
    pub provider_settings: ProviderSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("threshold", &self.threshold)
            .field("telegram", &self.telegram)
            .field("check_interval_hours", &self.check_interval_hours)
            .field("ledger_path", &self.ledger_path)
            .field("sweep_policy", &self.sweep_policy)
            .field("status_addr", &self.status_addr)
            .field("provider_settings", &self.provider_settings)
            .finish()
    }
}

/// Resolves `NAME` as `{PREFIX}NAME`, falling back to the bare `NAME`.
/// Blank values count as unset.
struct Vars<F> {
    prefix: &'static str,
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        let non_blank = |value: String| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        (self.lookup)(&format!("{}{}", self.prefix, name))
            .and_then(non_blank)
            .or_else(|| (self.lookup)(name).and_then(non_blank))
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::Missing(format!("{}{}", self.prefix, name)))
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }
}

impl Config {
    pub fn from_env(provider: ProviderKind) -> Result<Self, ConfigError> {
        Self::from_lookup(provider, |name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(provider: ProviderKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars {
            prefix: provider.env_prefix(),
            lookup,
        };

        let email = vars.required("EMAIL")?;
        let password = vars.required("PASSWORD")?;

        let threshold = vars
            .required("WALLET_THRESHOLD")?
            .parse::<i64>()
            .map_err(|_| ConfigError::invalid("WALLET_THRESHOLD", "must be an integer"))?;

        let topic_id = vars
            .get("TELEGRAM_TOPIC_ID")
            .map(|raw| raw.parse::<i64>())
            .transpose()
            .map_err(|_| ConfigError::invalid("TELEGRAM_TOPIC_ID", "must be an integer"))?;

        let telegram = TelegramSettings {
            api_url: vars.or("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL),
            bot_token: vars.required("TELEGRAM_BOT_TOKEN")?,
            chat_id: vars.required("TELEGRAM_CHAT_ID")?,
            topic_id,
        };

        let check_interval_hours = match vars.get("CHECK_INTERVAL_HOURS") {
            None => DEFAULT_CHECK_INTERVAL_HOURS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(hours) if (1..=MAX_CHECK_INTERVAL_HOURS).contains(&hours) => hours,
                _ => {
                    return Err(ConfigError::invalid(
                        "CHECK_INTERVAL_HOURS",
                        format!(
                            "must be a whole number of hours between 1 and {}",
                            MAX_CHECK_INTERVAL_HOURS
                        ),
                    ))
                }
            },
        };

        let sweep_policy = match vars.get("RETAIN_FAILED_DELETES") {
            None => SweepPolicy::DiscardFailed,
            Some(raw) => {
                if parse_flag(&raw).ok_or_else(|| {
                    ConfigError::invalid("RETAIN_FAILED_DELETES", "expected true or false")
                })? {
                    SweepPolicy::RetainFailed
                } else {
                    SweepPolicy::DiscardFailed
                }
            }
        };

        let status_addr = vars
            .get("STATUS_ADDR")
            .map(|raw| raw.parse::<SocketAddr>())
            .transpose()
            .map_err(|e| ConfigError::invalid("STATUS_ADDR", e.to_string()))?;

        let provider_settings = match provider {
            ProviderKind::Arvan => ProviderSettings::Arvan {
                auth_url: vars.or("AUTH_URL", DEFAULT_ARVAN_AUTH_URL),
                api_url: vars.or("API_URL", DEFAULT_ARVAN_API_URL),
            },
            ProviderKind::Hamravesh => ProviderSettings::Hamravesh {
                api_url: vars.or("API_URL", DEFAULT_HAMRAVESH_API_URL),
                cookie: vars.get("COOKIE"),
                token_cache_path: PathBuf::from(vars.or("TOKEN_CACHE_PATH", DEFAULT_TOKEN_CACHE_PATH)),
            },
        };

        Ok(Self {
            provider,
            email,
            password,
            threshold,
            telegram,
            check_interval_hours,
            ledger_path: PathBuf::from(vars.or("MESSAGE_LEDGER_PATH", DEFAULT_LEDGER_PATH)),
            sweep_policy,
            status_addr,
            provider_settings,
        })
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_hours.saturating_mul(3600))
    }

    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig {
            provider_key: self.provider.key().to_string(),
            threshold: self.threshold,
            chat: ChatTarget::new(self.telegram.chat_id.clone()).with_thread(self.telegram.topic_id),
            parse_mode: ParseMode::Markdown,
            style: self.provider.alert_style(),
            sweep_policy: self.sweep_policy,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
