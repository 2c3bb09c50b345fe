//! Reuse of access tokens until shortly before they expire.
//!
//! A plain export run refreshes once per fetch cycle and never needs this.
//! Long-lived callers that run many cycles can wrap their client in a
//! [`CachedTokenSource`] so each cycle only hits the token endpoint when the
//! previous access token is about to lapse.

use crate::{ActivityRecord, AuthError, FetchOptions, StravaClient, StravaError, TokenResponse};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Margin before token expiration when we proactively refresh (5 minutes).
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

pub struct CachedTokenSource<C: ?Sized> {
    client: Arc<C>,
    margin_secs: i64,
    cached: Mutex<Option<TokenResponse>>,
}

impl<C: StravaClient + ?Sized> CachedTokenSource<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            margin_secs: DEFAULT_REFRESH_MARGIN.as_secs() as i64,
            cached: Mutex::new(None),
        }
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin_secs = i64::try_from(margin.as_secs()).unwrap_or(i64::MAX);
        self
    }

    /// A token that stays valid for at least the configured margin.
    pub async fn access_token(&self) -> Result<SecretString, AuthError> {
        self.access_token_at(Utc::now().timestamp()).await
    }

    async fn access_token_at(&self, now: i64) -> Result<SecretString, AuthError> {
        let mut slot = self.cached.lock().await;
        if let Some(token) = slot.as_ref().filter(|t| is_fresh(t, now, self.margin_secs)) {
            debug!(expires_at = ?token.expires_at, "reusing cached access token");
            return Ok(token.access_token.clone());
        }

        let token = self.client.refresh_token().await?;
        let access_token = token.access_token.clone();
        // without an expiry there is no way to tell when it goes stale
        *slot = token.expires_at.is_some().then_some(token);
        Ok(access_token)
    }

    /// Drop the cached token, e.g. after the provider rejected it.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    /// Fetch activities with a cached (or freshly refreshed) access token.
    pub async fn fetch_activities(
        &self,
        options: &FetchOptions,
    ) -> Result<Vec<ActivityRecord>, StravaError> {
        let token = self.access_token().await?;
        Ok(self
            .client
            .fetch_activities(token.expose_secret(), options)
            .await?)
    }
}

fn is_fresh(token: &TokenResponse, now: i64, margin_secs: i64) -> bool {
    token
        .expires_at
        .is_some_and(|expires_at| now < expires_at.saturating_sub(margin_secs))
}
