//! HTTP client implementation for the Strava API.
//!
//! This module provides a reqwest-based implementation of the [`StravaClient`](crate::StravaClient) trait.

use crate::config::Config;
use crate::token_store::RefreshTokenStore;
use crate::{
    ActivityRecord, AuthError, FetchError, FetchOptions, StravaClient, StravaError,
    TokenResponse, TransportError, body_snippet,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Pause between successive page requests to stay well inside Strava's rate limits.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(200);

/// Client for the Strava API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestStravaClient {
    token_url: String,
    api_base_url: String,
    client_id: String,
    client_secret: SecretString,
    refresh_token: Arc<RwLock<SecretString>>,
    token_store: Option<RefreshTokenStore>,
    page_delay: Duration,
    client: reqwest::Client,
}

impl ReqwestStravaClient {
    /// Create a new client from an already loaded [`Config`].
    ///
    /// Every request is bounded by `config.request_timeout`; exceeding it is
    /// reported as a transport error and never retried.
    pub fn new(config: Config) -> Result<Self, StravaError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StravaError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self {
            token_url: config.token_url,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client_id: config.credentials.client_id,
            client_secret: config.credentials.client_secret,
            refresh_token: Arc::new(RwLock::new(config.credentials.refresh_token)),
            token_store: config.refresh_token_store,
            page_delay: DEFAULT_PAGE_DELAY,
            client,
        })
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// The refresh token the next exchange will use.
    pub async fn current_refresh_token(&self) -> SecretString {
        self.refresh_token.read().await.clone()
    }

    /// Switch to a refresh token handed back by the provider and persist it
    /// when a store is configured.
    async fn adopt_rotated_refresh_token(
        &self,
        used: &SecretString,
        token: &TokenResponse,
    ) -> Result<(), AuthError> {
        let Some(rotated) = token.refresh_token.as_ref() else {
            return Ok(());
        };
        if rotated.expose_secret().is_empty() || rotated.expose_secret() == used.expose_secret() {
            return Ok(());
        }

        *self.refresh_token.write().await = rotated.clone();
        match &self.token_store {
            Some(store) => {
                store
                    .save(rotated)
                    .await
                    .map_err(AuthError::PersistRefreshToken)?;
                info!(path = %store.path().display(), "persisted rotated refresh token");
            }
            None => warn!(
                "provider rotated the refresh token; set STRAVA_REFRESH_TOKEN_FILE to keep it across runs"
            ),
        }
        Ok(())
    }

    async fn fetch_page(
        &self,
        url: &str,
        access_token: &str,
        options: &FetchOptions,
        page: u32,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        let mut query: Vec<(&str, String)> = vec![
            ("per_page", options.per_page.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(after) = options.after {
            query.push(("after", after.to_string()));
        }
        debug!(page, per_page = options.per_page, after = ?options.after, "requesting activity page");

        let transport = |e: reqwest::Error| FetchError::Transport {
            page,
            source: TransportError::from(e),
        };
        let resp = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(FetchError::Status {
                page,
                status: status.as_u16(),
                body: body_snippet(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::MalformedBody {
            page,
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl StravaClient for ReqwestStravaClient {
    async fn refresh_token(&self) -> Result<TokenResponse, AuthError> {
        let refresh_token = self.current_refresh_token().await;
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];
        debug!(url = %self.token_url, "exchanging refresh token");

        let resp = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(TransportError::from)?;
        let status = resp.status();
        let body = resp.text().await.map_err(TransportError::from)?;
        if !status.is_success() {
            return Err(AuthError::Status {
                status: status.as_u16(),
                body: body_snippet(&body),
            });
        }

        let token = TokenResponse::from_body(&body)?;
        self.adopt_rotated_refresh_token(&refresh_token, &token)
            .await?;
        info!(expires_at = ?token.expires_at, "obtained access token");
        Ok(token)
    }

    async fn fetch_activities_each_page(
        &self,
        access_token: &str,
        options: &FetchOptions,
        on_page: &mut (dyn for<'p> FnMut(u32, &'p [ActivityRecord]) + Send),
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        options.validate()?;
        let url = format!("{}/athlete/activities", self.api_base_url);

        let mut activities = Vec::new();
        let mut page = 1u32;
        loop {
            if options.max_pages.is_some_and(|max| page > max) {
                break;
            }
            if page > 1 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let records = self.fetch_page(&url, access_token, options, page).await?;
            if records.is_empty() {
                debug!(page, "empty page, end of activity list");
                break;
            }
            info!(page, count = records.len(), "retrieved activity page");
            on_page(page, records.as_slice());
            activities.extend(records);
            page += 1;
        }

        info!(total = activities.len(), "activities retrieved");
        Ok(activities)
    }
}
