//! Test fixtures for bearer tokens
//!
//! Import via `use crate::auth::fixtures::TokenBuilder` in test modules.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value, json};

/// Builder for unsigned compact tokens with a chosen payload.
///
/// # Example
/// ```ignore
/// let token = TokenBuilder::new()
///     .username("jdoe")
///     .roles(&["admin"])
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenBuilder {
    payload: Map<String, Value>,
}

impl TokenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode an arbitrary payload as a token.
    pub fn from_payload(payload: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    fn claim(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    pub fn username(self, username: &str) -> Self {
        self.claim("preferred_username", json!(username))
    }

    pub fn email(self, email: &str) -> Self {
        self.claim("email", json!(email))
    }

    pub fn given_name(self, name: &str) -> Self {
        self.claim("given_name", json!(name))
    }

    pub fn family_name(self, name: &str) -> Self {
        self.claim("family_name", json!(name))
    }

    pub fn name(self, name: &str) -> Self {
        self.claim("name", json!(name))
    }

    pub fn subject(self, sub: &str) -> Self {
        self.claim("sub", json!(sub))
    }

    pub fn audience(self, aud: Value) -> Self {
        self.claim("aud", aud)
    }

    /// Set `exp` (Unix seconds).
    pub fn expires_at(self, exp: i64) -> Self {
        self.claim("exp", json!(exp))
    }

    pub fn roles(self, roles: &[&str]) -> Self {
        self.claim("realm_access", json!({ "roles": roles }))
    }

    /// Distinguishes otherwise identical tokens.
    pub fn nonce(self, nonce: &str) -> Self {
        self.claim("jti", json!(nonce))
    }

    pub fn build(self) -> String {
        Self::from_payload(Value::Object(self.payload))
    }
}
