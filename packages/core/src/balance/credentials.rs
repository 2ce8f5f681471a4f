//! Two-state credential retry policy.
//!
//! A source that can reuse a token from an earlier run implements
//! [`TokenAuthenticated`]. [`call_with_credential_retry`] then tries the
//! cached token first and, if that call fails for any reason, logs in
//! exactly once and retries with the fresh token. A failure on the fresh
//! token is final.

use async_trait::async_trait;

use super::error::SourceError;

#[async_trait]
pub trait TokenAuthenticated {
    type Output: Send;

    /// Token left over from an earlier login, if any.
    fn cached_token(&self) -> Option<String>;

    /// Obtain a fresh token. Implementations persist it for the next run.
    async fn login(&self) -> Result<String, SourceError>;

    /// Perform the authenticated request.
    async fn call(&self, token: &str) -> Result<Self::Output, SourceError>;
}

pub async fn call_with_credential_retry<S>(source: &S) -> Result<S::Output, SourceError>
where
    S: TokenAuthenticated + Sync + ?Sized,
{
    if let Some(token) = source.cached_token() {
        match source.call(&token).await {
            Ok(output) => return Ok(output),
            Err(err) => {
                tracing::warn!("Cached credential rejected, logging in again: {}", err);
            }
        }
    }

    let token = source.login().await?;
    source.call(&token).await
}
