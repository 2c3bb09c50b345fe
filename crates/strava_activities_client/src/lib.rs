//! `StravaClient` trait, typed activity records and a reqwest-backed client
//! for the refresh-token exchange and the paginated activity listing.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod shaping;
pub mod sink;
pub mod token_cache;
pub mod token_store;

/// Strava never returns more than this many activities per page.
pub const MAX_PER_PAGE: u32 = 100;

/// Failure below the HTTP layer: no status code was ever received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("http transport error: {0}")]
    Other(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err)
        } else if err.is_connect() {
            TransportError::Connect(err)
        } else {
            TransportError::Other(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token refresh rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("token refresh returned a malformed body: {0}")]
    MalformedBody(String),
    #[error("token refresh request failed")]
    Transport(#[from] TransportError),
    #[error("could not persist rotated refresh token")]
    PersistRefreshToken(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid fetch options: {0}")]
    InvalidInput(String),
    #[error("activity page {page} rejected with HTTP {status}: {body}")]
    Status { page: u32, status: u16, body: String },
    #[error("activity page {page} is not a valid activity list: {detail}")]
    MalformedBody { page: u32, detail: String },
    #[error("activity page {page} request failed")]
    Transport {
        page: u32,
        #[source]
        source: TransportError,
    },
}

/// Errors surfaced by a whole export run.
#[derive(Debug, Error)]
pub enum StravaError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("csv output error: {0}")]
    Output(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one refresh-token exchange.
#[derive(Clone, Debug)]
pub struct TokenResponse {
    pub access_token: SecretString,
    /// Unix timestamp after which `access_token` is no longer accepted.
    pub expires_at: Option<i64>,
    /// Present when the provider hands back a (possibly rotated) refresh token.
    pub refresh_token: Option<SecretString>,
    pub token_type: Option<String>,
}

#[derive(Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    expires_at: Option<i64>,
    refresh_token: Option<String>,
    token_type: Option<String>,
}

impl TokenResponse {
    /// Parse the token endpoint body. A missing or empty `access_token` is
    /// an error rather than a token that would fail later.
    pub fn from_body(body: &str) -> Result<Self, AuthError> {
        let raw: RawTokenResponse = serde_json::from_str(body)
            .map_err(|e| AuthError::MalformedBody(e.to_string()))?;
        let access_token = raw
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MalformedBody("missing access_token".into()))?;
        Ok(Self {
            access_token: SecretString::new(access_token.into()),
            expires_at: raw.expires_at,
            refresh_token: raw.refresh_token.map(|t| SecretString::new(t.into())),
            token_type: raw.token_type,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// The subset of a Strava summary activity the export depends on.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub id: u64,
    pub start_date_local: DateTime<FixedOffset>,
    /// Meters.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub distance: f64,
    /// Seconds.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub moving_time: u64,
    #[serde(default, deserialize_with = "deserialize_latlng")]
    pub start_latlng: Option<LatLng>,
    /// Meters per second.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub average_speed: f64,
    /// Meters per second.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub max_speed: f64,
    #[serde(rename = "type", default, deserialize_with = "deserialize_null_default")]
    pub activity_type: String,
}

// Missing and explicit null both mean "not recorded".
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Strava sends `[]` (or null) for activities recorded without GPS.
fn deserialize_latlng<'de, D>(deserializer: D) -> Result<Option<LatLng>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<Vec<f64>> = Option::deserialize(deserializer)?;
    match value.as_deref() {
        None | Some([]) => Ok(None),
        Some([lat, lng]) => Ok(Some(LatLng {
            lat: *lat,
            lng: *lng,
        })),
        Some(other) => Err(D::Error::custom(format!(
            "expected [lat, lng], got {} values",
            other.len()
        ))),
    }
}

/// Query options for one paginated listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// Only activities that started after this Unix timestamp.
    pub after: Option<i64>,
    pub per_page: u32,
    /// `None` keeps requesting pages until the provider returns an empty one.
    pub max_pages: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            after: None,
            per_page: MAX_PER_PAGE,
            max_pages: Some(1),
        }
    }
}

impl FetchOptions {
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(FetchError::InvalidInput(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }
        if self.max_pages == Some(0) {
            return Err(FetchError::InvalidInput(
                "max_pages must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait StravaClient: Send + Sync + 'static {
    /// Exchange the configured refresh token for a fresh access token.
    async fn refresh_token(&self) -> Result<TokenResponse, AuthError>;

    /// Page through `/athlete/activities`, calling `on_page` after every
    /// non-empty page so callers can keep what arrived before a failure.
    async fn fetch_activities_each_page(
        &self,
        access_token: &str,
        options: &FetchOptions,
        on_page: &mut (dyn for<'p> FnMut(u32, &'p [ActivityRecord]) + Send),
    ) -> Result<Vec<ActivityRecord>, FetchError>;

    async fn fetch_activities(
        &self,
        access_token: &str,
        options: &FetchOptions,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        self.fetch_activities_each_page(
            access_token,
            options,
            &mut |_: u32, _: &[ActivityRecord]| {},
        )
        .await
    }
}

/// Token and activities produced by one refresh followed by one listing.
#[derive(Debug)]
pub struct FetchCycle {
    pub token: TokenResponse,
    pub activities: Vec<ActivityRecord>,
}

pub async fn fetch_cycle<C>(client: &C, options: &FetchOptions) -> Result<FetchCycle, StravaError>
where
    C: StravaClient + ?Sized,
{
    let token = client.refresh_token().await?;
    let activities = client
        .fetch_activities(token.access_token.expose_secret(), options)
        .await?;
    Ok(FetchCycle { token, activities })
}

pub(crate) fn body_snippet(body: &str) -> String {
    body.chars().take(256).collect()
}
