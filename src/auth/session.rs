//! Session and bearer token lifecycle
//!
//! [`SessionManager`] is the single source of truth for "am I logged in"
//! and "which bearer token do I send". It caches both so views can read
//! them without touching the broker, and refreshes the token shortly
//! before it expires.
//!
//! Failures are handled differently depending on the caller:
//! - passive checks ([`refresh_auth_state`](SessionManager::refresh_auth_state),
//!   [`is_logged_in`](SessionManager::is_logged_in)) swallow errors and
//!   report "not logged in";
//! - explicit token requests ([`fresh_token`](SessionManager::fresh_token),
//!   [`load_user_profile`](SessionManager::load_user_profile)) propagate them.
//!
//! Either way a failed refresh clears the cached session.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use log::{debug, error, warn};

use super::broker::{AuthResult, IdentityBroker, UserProfile};
use super::claims::{TokenInfo, UserClaims, decode_claims, inspect_token};
use crate::error::AuthError;

/// Refresh the token when it expires within this many seconds
pub const TOKEN_MIN_VALIDITY_SECS: u64 = 30;

/// Cached login state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub token: String,
}

impl Session {
    fn with_token(token: String) -> Self {
        Self {
            authenticated: !token.is_empty(),
            token,
        }
    }
}

/// Owns the cached [`Session`] in front of an [`IdentityBroker`]
pub struct SessionManager {
    broker: Arc<dyn IdentityBroker>,
    session: RwLock<Session>,
}

impl SessionManager {
    /// Create a manager with an empty session
    pub fn new(broker: Arc<dyn IdentityBroker>) -> Self {
        Self {
            broker,
            session: RwLock::new(Session::default()),
        }
    }

    /// Create a manager and populate it from the broker's current state
    pub async fn start(broker: Arc<dyn IdentityBroker>) -> Arc<Self> {
        let manager = Arc::new(Self::new(broker));
        manager.refresh_auth_state().await;
        manager
    }

    /// Snapshot of the cached session
    pub fn snapshot(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn set_token(&self, token: String) {
        self.replace(Session::with_token(token));
    }

    fn clear(&self) {
        self.replace(Session::default());
    }

    /// Re-read login status and token from the broker, refreshing the token if needed.
    ///
    /// Any failure clears the cached session before it is returned.
    async fn sync_with_broker(&self) -> AuthResult<bool> {
        match self.try_sync_with_broker().await {
            Ok(logged_in) => Ok(logged_in),
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    async fn try_sync_with_broker(&self) -> AuthResult<bool> {
        if !self.broker.is_logged_in().await? {
            self.clear();
            return Ok(false);
        }
        self.refresh_token_if_needed().await?;
        let token = self.broker.get_token().await?;
        self.set_token(token);
        Ok(self.is_logged_in_sync())
    }

    /// Refresh the cached token when the broker says it is close to expiry.
    ///
    /// Clears the session and returns the error if the refresh fails.
    async fn refresh_token_if_needed(&self) -> AuthResult<()> {
        match self.broker.update_token(TOKEN_MIN_VALIDITY_SECS).await {
            Ok(true) => {
                debug!("Token refreshed");
                let token = self.broker.get_token().await.inspect_err(|_| self.clear())?;
                self.set_token(token);
                Ok(())
            }
            Ok(false) => {
                debug!("Token is still valid");
                Ok(())
            }
            Err(e) => {
                log_auth_failure("Token refresh failed", &e);
                self.clear();
                Err(e)
            }
        }
    }

    /// Passive refresh of the cached state. Errors leave the user logged out.
    pub async fn refresh_auth_state(&self) {
        if let Err(e) = self.sync_with_broker().await {
            warn!("Failed to refresh auth state: {}", e);
        }
    }

    /// Last known login state, without I/O
    pub fn is_logged_in_sync(&self) -> bool {
        self.snapshot().authenticated
    }

    /// Re-validate the login state against the broker
    pub async fn is_logged_in(&self) -> bool {
        match self.sync_with_broker().await {
            Ok(logged_in) => logged_in,
            Err(e) => {
                warn!("Error checking login status: {}", e);
                false
            }
        }
    }

    /// Run the broker's interactive login, then reload the cached state
    pub async fn login(&self) -> AuthResult<()> {
        self.broker.login().await?;
        self.refresh_auth_state().await;
        Ok(())
    }

    /// Log out at the broker. The cached session is cleared regardless of the outcome.
    pub async fn logout(&self) -> AuthResult<()> {
        let result = self.broker.logout().await;
        self.clear();
        result
    }

    /// Current token after a freshness check; errors propagate.
    pub async fn fresh_token(&self) -> AuthResult<String> {
        self.refresh_token_if_needed().await?;
        let token = self.broker.get_token().await.inspect_err(|_| self.clear())?;
        self.set_token(token.clone());
        Ok(token)
    }

    /// Current token after a freshness check, or an empty string on failure
    pub async fn get_token(&self) -> String {
        match self.fresh_token().await {
            Ok(token) => token,
            Err(e) => {
                log_auth_failure("Failed to get token", &e);
                String::new()
            }
        }
    }

    /// Last cached token, without validation
    pub fn get_token_sync(&self) -> String {
        self.snapshot().token
    }

    /// Realm role check; `false` when the broker cannot answer
    pub fn has_role(&self, role: &str) -> bool {
        self.broker.is_user_in_role(role).unwrap_or_else(|e| {
            debug!("Role check for '{}' failed: {}", role, e);
            false
        })
    }

    /// All realm roles; empty when the broker cannot answer
    pub fn user_roles(&self) -> Vec<String> {
        self.broker.user_roles().unwrap_or_else(|e| {
            debug!("Role lookup failed: {}", e);
            Vec::new()
        })
    }

    /// Identity claims of the cached token, without I/O
    pub fn get_user_info_from_token(&self) -> Option<UserClaims> {
        let session = self.snapshot();
        if !session.authenticated {
            debug!("No authenticated session, skipping token decode");
            return None;
        }
        decode_claims(&session.token)
    }

    /// Broker profile, fetched with a fresh token
    pub async fn load_user_profile(&self) -> AuthResult<UserProfile> {
        self.refresh_token_if_needed().await?;
        self.broker.load_user_profile().await.inspect_err(|e| {
            error!("Failed to load user profile: {}", e);
        })
    }

    /// Lifetime details of the current token
    pub async fn token_info(&self) -> Option<TokenInfo> {
        let token = self.get_token().await;
        inspect_token(&token, Utc::now())
    }
}

/// Being logged out is an expected state, not worth more than a debug line
fn log_auth_failure(context: &str, err: &AuthError) {
    match err {
        AuthError::NotLoggedIn => debug!("{}: {}", context, err),
        _ => error!("{}: {}", context, err),
    }
}
