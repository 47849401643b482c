//! Bearer token claims decoding
//!
//! Reads the payload segment of a compact token (`header.payload.signature`)
//! for display purposes. Signatures are not verified here; the Teams API
//! validates bearer tokens itself.

use std::collections::BTreeSet;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

/// Identity and role claims projected from a token payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserClaims {
    /// `preferred_username`
    pub username: Option<String>,

    pub email: Option<String>,

    /// `given_name`
    pub first_name: Option<String>,

    /// `family_name`
    pub last_name: Option<String>,

    /// Display name
    pub name: Option<String>,

    /// Realm roles (`realm_access.roles`), empty when absent
    pub roles: BTreeSet<String>,
}

/// Expiry and audience details of a token, for the `token` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub token_length: usize,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in_seconds: Option<i64>,
    pub is_expired: bool,
    pub audience: Vec<String>,
    pub subject: Option<String>,
    pub roles: BTreeSet<String>,
}

/// Payload object; each claim is read on its own so one ill-typed claim
/// does not hide the others
#[derive(Debug)]
struct RawClaims(Map<String, Value>);

impl RawClaims {
    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn exp(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    /// `realm_access.roles`; missing, null or ill-typed entries count as no roles
    fn roles(&self) -> BTreeSet<String> {
        self.0
            .get("realm_access")
            .and_then(|access| access.get("roles"))
            .and_then(Value::as_array)
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `aud` is either a single audience or a list
    fn audience(&self) -> Vec<String> {
        match self.0.get("aud") {
            Some(Value::String(aud)) => vec![aud.clone()],
            Some(Value::Array(auds)) => auds
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Decode base64url, tolerating trailing padding
fn base64_decode_url(input: &str) -> Result<Vec<u8>, String> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|e| e.to_string())
}

fn parse_payload(token: &str) -> Result<RawClaims, String> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(format!("expected 3 segments, found {}", segments.len()));
    }

    let payload = segments[1];
    if payload.is_empty() {
        return Err("payload segment is empty".to_string());
    }

    let bytes = base64_decode_url(payload).map_err(|e| format!("invalid base64url: {}", e))?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(RawClaims(map)),
        Ok(_) => Err("payload is not a JSON object".to_string()),
        Err(e) => Err(format!("invalid payload JSON: {}", e)),
    }
}

/// Decode the identity claims of a token.
///
/// Returns `None` for an empty or malformed token; the failure is logged.
pub fn decode_claims(token: &str) -> Option<UserClaims> {
    if token.is_empty() {
        debug!("No token to decode");
        return None;
    }

    match parse_payload(token) {
        Ok(raw) => Some(UserClaims {
            username: raw.string("preferred_username"),
            email: raw.string("email"),
            first_name: raw.string("given_name"),
            last_name: raw.string("family_name"),
            name: raw.string("name"),
            roles: raw.roles(),
        }),
        Err(e) => {
            warn!("Failed to decode token claims: {}", e);
            None
        }
    }
}

/// Describe a token's lifetime relative to `now`.
pub fn inspect_token(token: &str, now: DateTime<Utc>) -> Option<TokenInfo> {
    if token.is_empty() {
        return None;
    }

    let raw = match parse_payload(token) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to inspect token: {}", e);
            return None;
        }
    };

    // An `exp` outside the representable range is reported as unknown
    let exp = raw.exp();
    let expires_at = exp.and_then(|exp| DateTime::from_timestamp(exp, 0));
    let expires_in_seconds = exp.and_then(|exp| exp.checked_sub(now.timestamp()));

    Some(TokenInfo {
        token_length: token.len(),
        expires_at,
        expires_in_seconds,
        is_expired: expires_in_seconds.is_some_and(|secs| secs < 0),
        audience: raw.audience(),
        subject: raw.string("sub"),
        roles: raw.roles(),
    })
}
