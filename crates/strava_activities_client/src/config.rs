use crate::StravaError;
use crate::token_store::RefreshTokenStore;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// OAuth application credentials plus the long-lived refresh token.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        let client_secret: String = client_secret.into();
        let refresh_token: String = refresh_token.into();
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            refresh_token: SecretString::new(refresh_token.into()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub token_url: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Where rotated refresh tokens are written. `None` keeps them in memory only.
    pub refresh_token_store: Option<RefreshTokenStore>,
}

impl Config {
    /// Production endpoints and the default timeout.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token_url: DEFAULT_TOKEN_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            refresh_token_store: None,
        }
    }

    pub fn from_env() -> Result<Self, StravaError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    ///
    /// When `STRAVA_REFRESH_TOKEN_FILE` points at a non-empty file, its
    /// contents take precedence over `STRAVA_REFRESH_TOKEN`.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, StravaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let client_id = get("STRAVA_CLIENT_ID")
            .ok_or_else(|| StravaError::Config("STRAVA_CLIENT_ID missing".into()))?;
        let client_secret = get("STRAVA_CLIENT_SECRET")
            .ok_or_else(|| StravaError::Config("STRAVA_CLIENT_SECRET missing".into()))?;

        let refresh_token_store = get("STRAVA_REFRESH_TOKEN_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(RefreshTokenStore::new);
        let stored = match &refresh_token_store {
            Some(store) => store.load().map_err(|e| {
                StravaError::Config(format!(
                    "cannot read refresh token file {}: {e}",
                    store.path().display()
                ))
            })?,
            None => None,
        };
        let refresh_token = match stored {
            Some(token) => token,
            None => get("STRAVA_REFRESH_TOKEN")
                .map(|t| SecretString::new(t.into()))
                .ok_or_else(|| StravaError::Config("STRAVA_REFRESH_TOKEN missing".into()))?,
        };

        let token_url = get("STRAVA_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into());
        let api_base_url = get("STRAVA_API_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let timeout_secs = match get("STRAVA_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(StravaError::Config(
                        "STRAVA_HTTP_TIMEOUT_SECS must be at least 1".into(),
                    ));
                }
                Ok(secs) => secs,
                Err(_) => {
                    return Err(StravaError::Config(format!(
                        "STRAVA_HTTP_TIMEOUT_SECS is not a number: {raw}"
                    )));
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            credentials: Credentials {
                client_id,
                client_secret: SecretString::new(client_secret.into()),
                refresh_token,
            },
            token_url,
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            refresh_token_store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn base_env(k: &str) -> Option<String> {
        match k {
            "STRAVA_CLIENT_ID" => Some("12345".into()),
            "STRAVA_CLIENT_SECRET" => Some("shh".into()),
            "STRAVA_REFRESH_TOKEN" => Some("refresh-from-env".into()),
            _ => None,
        }
    }

    #[test]
    fn from_env_reads_values_and_defaults() {
        let cfg = Config::from_env_with(base_env).expect("cfg");
        assert_eq!(cfg.credentials.client_id, "12345");
        assert_eq!(cfg.credentials.client_secret.expose_secret(), "shh");
        assert_eq!(
            cfg.credentials.refresh_token.expose_secret(),
            "refresh-from-env"
        );
        assert_eq!(cfg.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
        assert!(cfg.refresh_token_store.is_none());
    }

    #[test]
    fn from_env_missing_refresh_token() {
        let get = |k: &str| match k {
            "STRAVA_REFRESH_TOKEN" => None,
            other => base_env(other),
        };
        let res = Config::from_env_with(get);
        assert!(matches!(res, Err(StravaError::Config(msg)) if msg.contains("STRAVA_REFRESH_TOKEN")));
    }

    #[test]
    fn from_env_missing_client_id() {
        let get = |k: &str| match k {
            "STRAVA_CLIENT_ID" => None,
            other => base_env(other),
        };
        assert!(Config::from_env_with(get).is_err());
    }

    #[test]
    fn from_env_allows_empty_secret() {
        let get = |k: &str| match k {
            "STRAVA_CLIENT_SECRET" => Some(String::new()),
            other => base_env(other),
        };
        let cfg = Config::from_env_with(get).expect("empty values reach the provider");
        assert_eq!(cfg.credentials.client_secret.expose_secret(), "");
    }

    #[test]
    fn from_env_overrides_endpoints_and_timeout() {
        let get = |k: &str| match k {
            "STRAVA_TOKEN_URL" => Some("http://localhost:9000/oauth/token".into()),
            "STRAVA_API_BASE_URL" => Some("http://localhost:9000/api/v3/".into()),
            "STRAVA_HTTP_TIMEOUT_SECS" => Some("3".into()),
            other => base_env(other),
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.token_url, "http://localhost:9000/oauth/token");
        assert_eq!(cfg.api_base_url, "http://localhost:9000/api/v3");
        assert_eq!(cfg.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn from_env_rejects_bad_timeout() {
        let get = |k: &str| match k {
            "STRAVA_HTTP_TIMEOUT_SECS" => Some("soon".into()),
            other => base_env(other),
        };
        assert!(matches!(
            Config::from_env_with(get),
            Err(StravaError::Config(_))
        ));
    }

    #[test]
    fn from_env_rejects_zero_timeout() {
        let get = |k: &str| match k {
            "STRAVA_HTTP_TIMEOUT_SECS" => Some("0".into()),
            other => base_env(other),
        };
        assert!(matches!(
            Config::from_env_with(get),
            Err(StravaError::Config(msg)) if msg.contains("at least 1")
        ));
    }

    #[test]
    fn refresh_token_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refresh_token");
        std::fs::write(&path, "refresh-from-file\n").unwrap();
        let path_str = path.to_string_lossy().into_owned();
        let get = |k: &str| match k {
            "STRAVA_REFRESH_TOKEN_FILE" => Some(path_str.clone()),
            "STRAVA_REFRESH_TOKEN" => None,
            other => base_env(other),
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(
            cfg.credentials.refresh_token.expose_secret(),
            "refresh-from-file"
        );
        assert_eq!(cfg.refresh_token_store.unwrap().path(), path.as_path());
    }

    #[test]
    fn refresh_token_file_missing_falls_back_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let path_str = dir.path().join("not-yet").to_string_lossy().into_owned();
        let get = |k: &str| match k {
            "STRAVA_REFRESH_TOKEN_FILE" => Some(path_str.clone()),
            other => base_env(other),
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(
            cfg.credentials.refresh_token.expose_secret(),
            "refresh-from-env"
        );
        assert!(cfg.refresh_token_store.is_some());
    }
}
