//! Hamravesh wallet client.
//!
//! The balance lives on the user profile (`organizations[0].balance`, in
//! Rial). Profile requests carry `Authorization: Token {key}`; the key comes
//! from the login endpoint and is cached on disk between runs, so most
//! checks need a single request.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::balance::{
    call_with_credential_retry, BalanceReading, BalanceSource, SourceError, TokenAuthenticated,
};
use crate::cache::TokenCache;
use crate::services::{expect_json, Scalar};

pub const DEFAULT_HAMRAVESH_API_URL: &str = "https://api.hamravesh.com";

const HAMRAVESH_USER_AGENT: &str = "insomnia/11.2.0";

pub struct HamraveshClient {
    api_base: String,
    email: String,
    password: String,
    cookie: Option<String>,
    token_cache: TokenCache,
    http: Client,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    captcha: Option<&'a str>,
    client_time: String,
    identity: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    organizations: Option<Vec<Organization>>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    balance: Option<Scalar>,
}

impl Profile {
    /// Balance of the first organization, if present and numeric.
    pub fn balance(&self) -> Option<i64> {
        self.organizations
            .as_deref()?
            .first()?
            .balance
            .as_ref()?
            .to_integer()
    }
}

impl HamraveshClient {
    pub fn new(
        api_base: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        cookie: Option<String>,
        token_cache: TokenCache,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            email: email.into(),
            password: password.into(),
            cookie,
            token_cache,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    fn with_common_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("User-Agent", HAMRAVESH_USER_AGENT);
        match &self.cookie {
            Some(cookie) => request.header("cookie", cookie),
            None => request,
        }
    }
}

#[async_trait]
impl TokenAuthenticated for HamraveshClient {
    type Output = Profile;

    fn cached_token(&self) -> Option<String> {
        self.token_cache.load()
    }

    async fn login(&self) -> Result<String, SourceError> {
        let request = self.http.post(self.url("/api/v1/users/login")).json(&LoginRequest {
            captcha: None,
            client_time: Utc::now().timestamp_millis().to_string(),
            identity: &self.email,
            password: &self.password,
        });

        let response = self
            .with_common_headers(request)
            .send()
            .await
            .map_err(|e| SourceError::network(format!("Hamravesh login request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::auth(format!(
                "Hamravesh login returned HTTP {}",
                response.status()
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| SourceError::format(format!("Hamravesh login response: {}", e)))?;

        let token = login
            .key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SourceError::auth("Login failed: no token in response"))?;

        self.token_cache.store(&token);
        tracing::debug!("Hamravesh login succeeded, token cached");
        Ok(token)
    }

    async fn call(&self, token: &str) -> Result<Profile, SourceError> {
        let request = self
            .http
            .get(self.url("/api/v2/users/profile"))
            .header("authorization", format!("Token {}", token));

        let response = self
            .with_common_headers(request)
            .send()
            .await
            .map_err(|e| SourceError::network(format!("Hamravesh profile request failed: {}", e)))?;

        expect_json(response, "Hamravesh profile").await
    }
}

#[async_trait]
impl BalanceSource for HamraveshClient {
    async fn fetch_balance(&self) -> Result<BalanceReading, SourceError> {
        let profile = call_with_credential_retry(self).await?;

        let balance = profile
            .balance()
            .ok_or_else(|| SourceError::format("Hamravesh profile has no organization balance"))?;

        Ok(BalanceReading::new(balance, "IRR"))
    }

    fn provider_name(&self) -> &str {
        "Hamravesh"
    }
}
