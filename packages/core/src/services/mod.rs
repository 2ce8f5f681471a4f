//! Outbound HTTP clients: the wallet vendors and the Telegram Bot API.

pub mod arvan;
pub mod hamravesh;
pub mod mock;
pub mod telegram;

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::balance::{BalanceSource, SourceError};
use crate::cache::TokenCache;
use crate::config::{Config, ProviderSettings};

use arvan::ArvanClient;
use hamravesh::HamraveshClient;

/// A JSON value vendors send as either a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Integer part of the value. Text is read up to the first non-digit
    /// (`"1200.50 IRR"` is 1200); text with no leading digits is `None`.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Scalar::Integer(v) => Some(*v),
            Scalar::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Scalar::Float(_) => None,
            Scalar::Text(s) => leading_integer(s),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Scalar::Integer(v) => v.to_string(),
            Scalar::Float(v) => v.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let magnitude = rest[..end].parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Check the status of a vendor response and decode its JSON body.
///
/// 401/403 map to [`SourceError::Auth`] so the credential retry can react;
/// any other non-success status is a network failure.
pub(crate) async fn expect_json<T: DeserializeOwned>(
    response: Response,
    what: &str,
) -> Result<T, SourceError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SourceError::auth(format!("{} returned HTTP {}", what, status)));
    }
    if !status.is_success() {
        return Err(SourceError::network(format!("{} returned HTTP {}", what, status)));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| SourceError::format(format!("{} response: {}", what, e)))
}

/// Build the balance source selected by the config.
pub fn balance_source_for(config: &Config) -> Arc<dyn BalanceSource + Send + Sync> {
    match &config.provider_settings {
        ProviderSettings::Arvan { auth_url, api_url } => Arc::new(ArvanClient::new(
            auth_url.clone(),
            api_url.clone(),
            config.email.clone(),
            config.password.clone(),
        )),
        ProviderSettings::Hamravesh {
            api_url,
            cookie,
            token_cache_path,
        } => Arc::new(HamraveshClient::new(
            api_url.clone(),
            config.email.clone(),
            config.password.clone(),
            cookie.clone(),
            TokenCache::new(token_cache_path.clone()),
        )),
    }
}
