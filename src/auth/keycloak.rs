//! Keycloak identity broker
//!
//! Talks to the realm's OpenID Connect endpoints. Login uses the OAuth 2.0
//! device authorization grant so it works from a terminal; the resulting
//! tokens are kept in memory and, when a storage path is set, in a
//! session file so later invocations can restore them silently.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::broker::{AuthResult, IdentityBroker, UserProfile};
use super::claims::decode_claims;
use crate::config::{BrokerConfig, write_private};
use crate::error::AuthError;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Extra wait added when the broker answers `slow_down`
const SLOW_DOWN_STEP_SECS: u64 = 5;

fn default_poll_interval() -> u64 {
    5
}

/// Tokens held by the broker between invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,

    /// Access token expiration time
    pub expires_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Refresh token expiration time; `None` for tokens without a fixed lifetime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<DateTime<Utc>>,
}

/// `now` plus a lifetime in seconds, or `None` when out of range
fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|lifetime| now.checked_add_signed(lifetime))
}

impl StoredSession {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> AuthResult<Self> {
        let out_of_range = |field: &str, secs: i64| {
            AuthError::InvalidResponse(format!("{} out of range: {}", field, secs))
        };

        let expires_at = expiry_after(now, response.expires_in)
            .ok_or_else(|| out_of_range("expires_in", response.expires_in))?;
        let refresh_expires_at = if response.refresh_expires_in > 0 {
            Some(
                expiry_after(now, response.refresh_expires_in)
                    .ok_or_else(|| out_of_range("refresh_expires_in", response.refresh_expires_in))?,
            )
        } else {
            None
        };

        Ok(Self {
            access_token: response.access_token,
            expires_at,
            refresh_token: response.refresh_token,
            refresh_expires_at,
        })
    }

    /// Check if the access token expires within `secs` of `now`.
    ///
    /// A window too large to represent covers every expiry.
    pub fn expires_within(&self, secs: u64, now: DateTime<Utc>) -> bool {
        i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|window| self.expires_at.checked_sub_signed(window))
            .is_none_or(|threshold| threshold <= now)
    }

    /// A session is unusable once both tokens have lapsed
    fn is_dead(&self, now: DateTime<Utc>) -> bool {
        let access_expired = self.expires_at <= now;
        let refresh_expired = match (&self.refresh_token, self.refresh_expires_at) {
            (None, _) => true,
            (Some(_), Some(expires_at)) => expires_at <= now,
            (Some(_), None) => false,
        };
        access_expired && refresh_expired
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
    #[serde(default)]
    refresh_expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

impl OAuthErrorResponse {
    fn describe(&self) -> String {
        match &self.error_description {
            Some(desc) => format!("{} ({})", self.error, desc),
            None => self.error.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeviceAuthorization {
    device_code: String,
    user_code: String,
    verification_uri: String,
    verification_uri_complete: Option<String>,
    expires_in: u64,
    #[serde(default = "default_poll_interval")]
    interval: u64,
}

#[derive(Debug, Clone, Default)]
enum BrokerState {
    #[default]
    Uninitialized,
    Ready(Option<StoredSession>),
}

/// Keycloak-backed [`IdentityBroker`]
pub struct KeycloakBroker {
    http: HttpClient,
    config: BrokerConfig,
    storage: Option<PathBuf>,
    state: RwLock<BrokerState>,
}

impl KeycloakBroker {
    /// Create a broker for the given realm. Call [`init`](Self::init) before use.
    pub fn new(config: BrokerConfig) -> AuthResult<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(AuthError::from)?;

        Ok(Self {
            http,
            config,
            storage: None,
            state: RwLock::new(BrokerState::Uninitialized),
        })
    }

    /// Persist the session to `path` between runs
    pub fn with_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage = Some(path.into());
        self
    }

    /// Restore a stored session without user interaction.
    ///
    /// An unreadable session file or one whose tokens have all expired is
    /// discarded; the broker then starts logged out. Returns whether a
    /// session was restored.
    pub fn init(&self) -> AuthResult<bool> {
        let now = Utc::now();
        let restored = match self.storage.as_deref() {
            Some(path) => match load_session(path) {
                Ok(Some(session)) if session.is_dead(now) => {
                    debug!("Stored session has expired, discarding it");
                    remove_session(path)?;
                    None
                }
                Ok(session) => session,
                Err(e) => {
                    warn!("Ignoring unreadable session file: {}", e);
                    None
                }
            },
            None => None,
        };

        let logged_in = restored.is_some();
        *self.write_state() = BrokerState::Ready(restored);
        debug!("Identity broker initialized (session restored: {})", logged_in);
        Ok(logged_in)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, BrokerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, BrokerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current session
    fn current(&self) -> AuthResult<Option<StoredSession>> {
        match &*self.read_state() {
            BrokerState::Uninitialized => Err(AuthError::NotInitialized),
            BrokerState::Ready(session) => Ok(session.clone()),
        }
    }

    fn store(&self, session: Option<StoredSession>) -> AuthResult<()> {
        if let Some(path) = self.storage.as_deref() {
            match &session {
                Some(s) => save_session(path, s)?,
                None => remove_session(path)?,
            }
        }
        *self.write_state() = BrokerState::Ready(session);
        Ok(())
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.oidc_base(), name)
    }

    async fn request_device_code(&self) -> AuthResult<DeviceAuthorization> {
        let response = self
            .http
            .post(self.endpoint("auth/device"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("scope", "openid"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let err = oauth_error(response).await;
            return Err(AuthError::LoginFailed(err.describe()));
        }

        response
            .json::<DeviceAuthorization>()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("device authorization: {}", e)))
    }

    async fn poll_device_token(&self, device: &DeviceAuthorization) -> AuthResult<TokenResponse> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = device.interval;

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if tokio::time::Instant::now() > deadline {
                return Err(AuthError::LoginExpired);
            }

            let response = self
                .http
                .post(self.endpoint("token"))
                .form(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("device_code", device.device_code.as_str()),
                    ("client_id", self.config.client_id.as_str()),
                ])
                .send()
                .await?;

            if response.status().is_success() {
                return parse_token_response(response).await;
            }

            let err = oauth_error(response).await;
            match err.error.as_str() {
                "authorization_pending" => continue,
                "slow_down" => {
                    interval += SLOW_DOWN_STEP_SECS;
                    debug!("Broker asked to slow down, polling every {}s", interval);
                }
                "expired_token" => return Err(AuthError::LoginExpired),
                "access_denied" => return Err(AuthError::AccessDenied),
                _ => return Err(AuthError::LoginFailed(err.describe())),
            }
        }
    }
}

#[async_trait]
impl IdentityBroker for KeycloakBroker {
    async fn is_logged_in(&self) -> AuthResult<bool> {
        Ok(self.current()?.is_some())
    }

    async fn login(&self) -> AuthResult<()> {
        self.current()?;

        let device = self.request_device_code().await?;
        let url = device
            .verification_uri_complete
            .as_deref()
            .unwrap_or(&device.verification_uri);

        eprintln!("To sign in, open this URL in a browser:");
        eprintln!("  {}", url.cyan());
        eprintln!("and confirm the code {}", device.user_code.bold());

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Waiting for sign-in...");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = self.poll_device_token(&device).await;
        spinner.finish_and_clear();

        let session = StoredSession::from_response(result?, Utc::now())?;
        self.store(Some(session))?;
        debug!("Device login completed");
        Ok(())
    }

    async fn logout(&self) -> AuthResult<()> {
        let session = self.current()?;

        let result = match session.and_then(|s| s.refresh_token) {
            Some(refresh_token) => {
                let outcome = self
                    .http
                    .post(self.endpoint("logout"))
                    .form(&[
                        ("client_id", self.config.client_id.as_str()),
                        ("refresh_token", refresh_token.as_str()),
                    ])
                    .send()
                    .await;

                match outcome {
                    Ok(response) if response.status().is_success() => Ok(()),
                    Ok(response) => {
                        let err = oauth_error(response).await;
                        Err(AuthError::InvalidResponse(format!("logout: {}", err.describe())))
                    }
                    Err(e) => Err(AuthError::from(e)),
                }
            }
            None => Ok(()),
        };

        self.store(None)?;
        result
    }

    async fn get_token(&self) -> AuthResult<String> {
        self.current()?
            .map(|s| s.access_token)
            .ok_or(AuthError::NotLoggedIn)
    }

    async fn update_token(&self, min_validity_secs: u64) -> AuthResult<bool> {
        let session = self.current()?.ok_or(AuthError::NotLoggedIn)?;
        let now = Utc::now();

        if !session.expires_within(min_validity_secs, now) {
            return Ok(false);
        }

        let refresh_token = session
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token".to_string()))?;

        debug!("Access token expires within {}s, refreshing", min_validity_secs);
        let response = self
            .http
            .post(self.endpoint("token"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let err = oauth_error(response).await;
            self.store(None)?;
            return Err(AuthError::RefreshFailed(err.describe()));
        }

        let mut refreshed =
            StoredSession::from_response(parse_token_response(response).await?, now)?;
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
            refreshed.refresh_expires_at = session.refresh_expires_at;
        }
        self.store(Some(refreshed))?;
        Ok(true)
    }

    fn is_user_in_role(&self, role: &str) -> AuthResult<bool> {
        Ok(self.user_roles()?.iter().any(|r| r == role))
    }

    fn user_roles(&self) -> AuthResult<Vec<String>> {
        Ok(self
            .current()?
            .and_then(|s| decode_claims(&s.access_token))
            .map(|claims| claims.roles.into_iter().collect())
            .unwrap_or_default())
    }

    async fn load_user_profile(&self) -> AuthResult<UserProfile> {
        let token = self.get_token().await?;

        let response = self
            .http
            .get(self.endpoint("userinfo"))
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => response
                .json::<UserProfile>()
                .await
                .map_err(|e| AuthError::InvalidResponse(format!("userinfo: {}", e))),
            StatusCode::UNAUTHORIZED => Err(AuthError::NotLoggedIn),
            status => Err(AuthError::InvalidResponse(format!(
                "userinfo returned {}",
                status
            ))),
        }
    }
}

async fn parse_token_response(response: Response) -> AuthResult<TokenResponse> {
    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AuthError::InvalidResponse(format!("token response: {}", e)))
}

async fn oauth_error(response: Response) -> OAuthErrorResponse {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str(&body).unwrap_or_else(|_| OAuthErrorResponse {
        error: format!("HTTP {}", status.as_u16()),
        error_description: None,
    })
}

fn load_session(path: &Path) -> Result<Option<StoredSession>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|e| e.to_string())
}

fn save_session(path: &Path, session: &StoredSession) -> AuthResult<()> {
    let contents =
        serde_yaml::to_string(session).map_err(|e| AuthError::Storage(e.to_string()))?;
    write_private(path, &contents).map_err(|e| AuthError::Storage(e.to_string()))
}

fn remove_session(path: &Path) -> AuthResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AuthError::Storage(e.to_string())),
    }
}
