//! Identity broker integration surface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Result type for broker operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// User profile as reported by the identity broker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "preferred_username")]
    pub username: Option<String>,

    pub email: Option<String>,

    #[serde(rename = "given_name")]
    pub first_name: Option<String>,

    #[serde(rename = "family_name")]
    pub last_name: Option<String>,

    #[serde(default)]
    pub email_verified: Option<bool>,
}

/// Operations the session layer needs from an identity broker.
///
/// Every method fails with [`AuthError::NotInitialized`] until the broker
/// has finished its own start-up.
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// Whether the broker currently holds an authenticated session
    async fn is_logged_in(&self) -> AuthResult<bool>;

    /// Run the interactive login flow; resolves once the user has signed in
    async fn login(&self) -> AuthResult<()>;

    /// End the broker session
    async fn logout(&self) -> AuthResult<()>;

    /// Current access token
    async fn get_token(&self) -> AuthResult<String>;

    /// Refresh the access token if it expires within `min_validity_secs`.
    ///
    /// Returns `true` when a new token was obtained.
    async fn update_token(&self, min_validity_secs: u64) -> AuthResult<bool>;

    /// Realm role check against the current token
    fn is_user_in_role(&self, role: &str) -> AuthResult<bool>;

    /// All realm roles of the current token
    fn user_roles(&self) -> AuthResult<Vec<String>>;

    /// Fetch the user's profile from the broker
    async fn load_user_profile(&self) -> AuthResult<UserProfile>;
}
