//! Arvan Cloud wallet client.
//!
//! Balance lookup is a three-step flow against two hosts:
//!
//! 1. `POST {auth}/v1/auth/login` → access token, refresh token, account id
//! 2. `POST {auth}/v1/auth/refresh-token` → a fresh access token
//! 3. `GET  {api}/resid/v1/wallets/me` with `Bearer {access}.{account}`
//!
//! Arvan reports balances in Rial. Every check logs in from scratch.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::balance::{BalanceReading, BalanceSource, SourceError};
use crate::services::{expect_json, Scalar};

pub const DEFAULT_ARVAN_AUTH_URL: &str = "https://dejban.arvancloud.ir";
pub const DEFAULT_ARVAN_API_URL: &str = "https://napi.arvancloud.ir";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0";
const ACCOUNTS_ORIGIN: &str = "https://accounts.arvancloud.ir";
const PANEL_ORIGIN: &str = "https://panel.arvancloud.ir";

#[derive(Clone)]
pub struct ArvanClient {
    auth_base: String,
    api_base: String,
    email: String,
    password: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    captcha: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    access_token: String,
    refresh_token: String,
    default_account: Scalar,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletData {
    total_balance: Scalar,
}

/// Tokens from a successful login.
struct Session {
    access_token: String,
    refresh_token: String,
    account: String,
}

impl Session {
    fn bearer(&self, access_token: &str) -> String {
        format!("Bearer {}.{}", access_token, self.account)
    }
}

impl ArvanClient {
    pub fn new(
        auth_base: impl Into<String>,
        api_base: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_base: auth_base.into(),
            api_base: api_base.into(),
            email: email.into(),
            password: password.into(),
            http: Client::new(),
        }
    }

    async fn login(&self) -> Result<Session, SourceError> {
        let url = format!("{}/v1/auth/login", self.auth_base.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("Origin", ACCOUNTS_ORIGIN)
            .header("Referer", format!("{}/", ACCOUNTS_ORIGIN))
            .header("x-redirect-uri", format!("{}/", PANEL_ORIGIN))
            .header("User-Agent", BROWSER_USER_AGENT)
            .json(&LoginRequest {
                email: &self.email,
                password: &self.password,
                captcha: "v3.undefined",
            })
            .send()
            .await
            .map_err(|e| SourceError::network(format!("Arvan login request failed: {}", e)))?;

        let login: Envelope<LoginData> = expect_json(response, "Arvan login").await?;

        Ok(Session {
            access_token: login.data.access_token,
            refresh_token: login.data.refresh_token,
            account: login.data.default_account.to_text(),
        })
    }

    async fn refresh(&self, session: &Session) -> Result<String, SourceError> {
        let url = format!(
            "{}/v1/auth/refresh-token",
            self.auth_base.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .header("Authorization", session.bearer(&session.access_token))
            .header("Accept-Language", "en")
            .json(&RefreshRequest {
                refresh_token: &session.refresh_token,
            })
            .send()
            .await
            .map_err(|e| SourceError::network(format!("Arvan token refresh failed: {}", e)))?;

        let refreshed: Envelope<RefreshData> = expect_json(response, "Arvan token refresh").await?;
        Ok(refreshed.data.access_token)
    }

    async fn query_wallet(&self, authorization: &str) -> Result<WalletData, SourceError> {
        let url = format!(
            "{}/resid/v1/wallets/me",
            self.api_base.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .header("Authorization", authorization)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Origin", PANEL_ORIGIN)
            .header("Referer", format!("{}/", PANEL_ORIGIN))
            .send()
            .await
            .map_err(|e| SourceError::network(format!("Arvan wallet request failed: {}", e)))?;

        let wallet: Envelope<WalletData> = expect_json(response, "Arvan wallet").await?;
        Ok(wallet.data)
    }
}

#[async_trait]
impl BalanceSource for ArvanClient {
    async fn fetch_balance(&self) -> Result<BalanceReading, SourceError> {
        let session = self.login().await?;
        let access_token = self.refresh(&session).await?;
        let wallet = self.query_wallet(&session.bearer(&access_token)).await?;

        let balance = wallet.total_balance.to_integer().ok_or_else(|| {
            SourceError::format(format!(
                "Arvan totalBalance is not a number: {}",
                wallet.total_balance.to_text()
            ))
        })?;

        Ok(BalanceReading::new(balance, "IRR"))
    }

    fn provider_name(&self) -> &str {
        "Arvan"
    }
}
