//! Mock identity broker for testing
//!
//! Provides a scripted [`IdentityBroker`] so the session layer can be
//! exercised without a Keycloak server.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::broker::{AuthResult, IdentityBroker, UserProfile};
use crate::error::AuthError;

/// Scripted broker.
///
/// # Example
/// ```ignore
/// let broker = MockBroker::new()
///     .logged_in("token-1")
///     .with_refreshes(vec!["token-2"]);
/// ```
pub struct MockBroker {
    initialized: bool,
    logged_in: Mutex<bool>,
    token: Mutex<String>,
    /// Tokens handed out by successive refreshes; empty means "still valid"
    refreshes: Mutex<VecDeque<String>>,
    /// Error returned by the next `update_token`
    refresh_error: Mutex<Option<AuthError>>,
    /// Error returned by the next `is_logged_in`
    status_error: Mutex<Option<AuthError>>,
    /// Token issued by `login`
    login_token: Mutex<Option<String>>,
    roles: Vec<String>,
    profile: UserProfile,
    login_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self {
            initialized: true,
            logged_in: Mutex::new(false),
            token: Mutex::new(String::new()),
            refreshes: Mutex::new(VecDeque::new()),
            refresh_error: Mutex::new(None),
            status_error: Mutex::new(None),
            login_token: Mutex::new(None),
            roles: Vec::new(),
            profile: UserProfile::default(),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Broker whose every call fails with `NotInitialized`
    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            ..Self::default()
        }
    }

    pub fn logged_in(self, token: &str) -> Self {
        *self.logged_in.lock().unwrap() = true;
        *self.token.lock().unwrap() = token.to_string();
        self
    }

    pub fn with_refreshes(self, tokens: Vec<&str>) -> Self {
        *self.refreshes.lock().unwrap() = tokens.into_iter().map(String::from).collect();
        self
    }

    pub fn with_refresh_error(self, err: AuthError) -> Self {
        *self.refresh_error.lock().unwrap() = Some(err);
        self
    }

    pub fn with_status_error(self, err: AuthError) -> Self {
        *self.status_error.lock().unwrap() = Some(err);
        self
    }

    pub fn with_login_token(self, token: &str) -> Self {
        *self.login_token.lock().unwrap() = Some(token.to_string());
        self
    }

    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn ensure_initialized(&self) -> AuthResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(AuthError::NotInitialized)
        }
    }
}

#[async_trait]
impl IdentityBroker for MockBroker {
    async fn is_logged_in(&self) -> AuthResult<bool> {
        self.ensure_initialized()?;
        if let Some(err) = self.status_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(*self.logged_in.lock().unwrap())
    }

    async fn login(&self) -> AuthResult<()> {
        self.ensure_initialized()?;
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.login_token.lock().unwrap().clone() {
            *self.token.lock().unwrap() = token;
            *self.logged_in.lock().unwrap() = true;
        }
        Ok(())
    }

    async fn logout(&self) -> AuthResult<()> {
        self.ensure_initialized()?;
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        *self.logged_in.lock().unwrap() = false;
        self.token.lock().unwrap().clear();
        Ok(())
    }

    async fn get_token(&self) -> AuthResult<String> {
        self.ensure_initialized()?;
        if !*self.logged_in.lock().unwrap() {
            return Err(AuthError::NotLoggedIn);
        }
        Ok(self.token.lock().unwrap().clone())
    }

    async fn update_token(&self, _min_validity_secs: u64) -> AuthResult<bool> {
        self.ensure_initialized()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.refresh_error.lock().unwrap().take() {
            *self.logged_in.lock().unwrap() = false;
            return Err(err);
        }
        match self.refreshes.lock().unwrap().pop_front() {
            Some(next) => {
                *self.token.lock().unwrap() = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn is_user_in_role(&self, role: &str) -> AuthResult<bool> {
        self.ensure_initialized()?;
        Ok(self.roles.iter().any(|r| r == role))
    }

    fn user_roles(&self) -> AuthResult<Vec<String>> {
        self.ensure_initialized()?;
        Ok(self.roles.clone())
    }

    async fn load_user_profile(&self) -> AuthResult<UserProfile> {
        self.ensure_initialized()?;
        Ok(self.profile.clone())
    }
}
